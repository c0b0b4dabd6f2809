use bridge_core::{BridgeError, TransportError};

use common::ErrorLocation;
use models::ModelError;

use std::error::Error;
use std::panic::Location;

/// **VALUE**: Verifies conversions record where the error was raised, not
/// where the `From` impl lives.
///
/// **BUG THIS CATCHES**: Would catch a missing `#[track_caller]` on a `From`
/// impl, which makes every location point into the error module.
#[test]
fn given_model_error_when_converted_then_location_is_call_site() {
    // GIVEN: A decode failure
    let model_error = ModelError::Decode {
        message: "missing field `kind`".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Converting at a known line
    let expected_line = line!() + 1;
    let error = BridgeError::from(model_error);

    // THEN: MalformedMessage pointing here
    match error {
        BridgeError::MalformedMessage { message, location } => {
            assert!(message.contains("missing field `kind`"));
            assert!(location.file.ends_with("bridge.rs"));
            assert_eq!(location.line, expected_line);
        }
        other => panic!("Expected MalformedMessage, got {other:?}"),
    }
}

#[test]
fn given_transport_error_when_converted_then_keeps_source() {
    // GIVEN: A transport failure
    let transport = TransportError::Closed {
        message: "Connection to ws://127.0.0.1:19876 is closed".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Wrapping it
    let error = BridgeError::from(transport);

    // THEN: Display names the kind; source is the transport error
    let rendered = error.to_string();
    assert!(rendered.starts_with("Transport Error: Closed Error: Connection to ws://127.0.0.1:19876"));
    let source = error.source().expect("Transport error keeps its source");
    assert!(source.to_string().starts_with("Closed Error:"));
}

#[test]
fn given_bridge_errors_when_displayed_then_use_kind_message_location_format() {
    let error = BridgeError::HandshakeTimeout {
        message: "No Init from https://host.example.com within 500ms".to_string(),
        location: ErrorLocation {
            file: "bridge/handshake.rs",
            line: 61,
            column: 13,
        },
    };

    assert_eq!(
        error.to_string(),
        "Handshake Timeout Error: No Init from https://host.example.com within 500ms [bridge/handshake.rs:61:13]"
    );
}

#[test]
fn given_url_parse_error_when_converted_then_is_invalid_origin() {
    let parse_error = url::Url::parse("no scheme").expect_err("not a URL");

    let error = BridgeError::from(parse_error);

    assert!(matches!(error, BridgeError::InvalidOrigin { .. }));
}
