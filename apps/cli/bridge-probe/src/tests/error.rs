// Unit tests for error conversions

use crate::error::ProbeError;

use bridge_core::{BridgeError, ConfigError, TransportError};

use common::ErrorLocation;

use std::error::Error;
use std::panic::Location;

/// **VALUE**: Verifies transport failures surface as bridge errors with the
/// original cause still reachable.
///
/// **WHY THIS MATTERS**: The probe prints one line on failure. It has to say
/// both that the bridge failed and why (e.g. connection refused).
#[test]
fn given_transport_error_when_converted_then_is_bridge_error_with_source_chain() {
    // GIVEN: A connect failure
    let transport = TransportError::Connect {
        message: "Failed to connect to ws://127.0.0.1:1: Connection refused".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN: Converting
    let error = ProbeError::from(transport);

    // THEN: Bridge variant whose source is a BridgeError::Transport
    assert!(error.to_string().starts_with("Bridge Error: Transport Error: Connect Error:"));
    let source = error.source().expect("Bridge error keeps its source");
    let bridge = source
        .downcast_ref::<BridgeError>()
        .expect("Source should be a BridgeError");
    assert!(matches!(bridge, BridgeError::Transport { .. }));
}

#[test]
fn given_config_error_when_converted_then_is_config_variant() {
    let config = ConfigError::ValidationError {
        message: "Invalid handshake timeout: 0ms (must be 1-60000)".to_string(),
        location: ErrorLocation::from(Location::caller()),
    };

    let error = ProbeError::from(config);

    match error {
        ProbeError::Config { message, .. } => assert!(message.contains("handshake timeout")),
        other => panic!("Expected ProbeError::Config, got {other:?}"),
    }
}
