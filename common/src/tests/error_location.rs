use crate::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` records the exact call site.
///
/// **WHY THIS MATTERS**: Every bridge error (handshake timeout, unregistered listener,
/// double destroy) is rendered with its location. A wrong line makes those reports useless.
///
/// **BUG THIS CATCHES**: Would catch if file, line, or column capture stops matching
/// the position of the `Location::caller()` call.
#[test]
fn given_caller_location_when_error_location_created_then_matches_current_line() {
    // GIVEN/WHEN: Capturing the location on a known line
    let expected_line = line!() + 1;
    let location = ErrorLocation::from(Location::caller());

    // THEN: File, line and column all point here
    assert!(location.file.ends_with("error_location.rs"));
    assert_eq!(location.line, expected_line);
    assert!(location.column > 0);
}

/// **VALUE**: Verifies the `[file:line:column]` rendering every error message ends with.
#[test]
fn given_error_location_when_displayed_then_uses_bracketed_triplet() {
    // GIVEN: A fixed location
    let location = ErrorLocation {
        file: "bridge/client.rs",
        line: 42,
        column: 7,
    };

    // WHEN: Rendering it
    let rendered = location.to_string();

    // THEN: The format is stable
    assert_eq!(rendered, "[bridge/client.rs:42:7]");
}

/// **VALUE**: Verifies `#[track_caller]` helpers report their caller, not themselves.
///
/// **BUG THIS CATCHES**: Would catch if error constructors lost `#[track_caller]`,
/// making every error point at the constructor instead of the failing call.
#[test]
fn given_track_caller_helper_when_called_twice_then_reports_each_call_site() {
    // GIVEN: A helper that captures its caller
    #[track_caller]
    fn capture() -> ErrorLocation {
        ErrorLocation::from(Location::caller())
    }

    // WHEN: Calling it from two consecutive lines
    let first = capture();
    let second = capture();

    // THEN: Same file, consecutive lines
    assert_eq!(first.file, second.file);
    assert_eq!(first.line + 1, second.line);
}

/// **VALUE**: Verifies locations serialize as structured fields for log shipping.
#[test]
fn given_error_location_when_serialized_then_exposes_fields() {
    // GIVEN: A fixed location
    let location = ErrorLocation {
        file: "handshake.rs",
        line: 3,
        column: 9,
    };

    // WHEN: Serializing to JSON
    let json = serde_json::to_value(location).expect("location should serialize");

    // THEN: Each field is present
    assert_eq!(
        json,
        serde_json::json!({"file": "handshake.rs", "line": 3, "column": 9})
    );
}
