use crate::{InitPayload, ModelError};

use serde_json::json;

/// **VALUE**: Verifies the `Init` payload maps `roomState` (camelCase on the wire)
/// onto the mirrored room state.
#[test]
fn given_init_payload_when_decoded_then_reads_attributes_and_room_state() {
    // GIVEN: A host Init payload
    let raw = json!({
        "attributes": {"totalPage": 3},
        "roomState": {"broadcastState": {"mode": "broadcaster"}}
    });

    // WHEN: Decoding
    let init = InitPayload::from_value(raw).expect("valid Init payload");

    // THEN: Both sections are populated
    assert_eq!(init.attributes.get("totalPage"), Some(&json!(3)));
    assert!(init.room_state.contains_key("broadcastState"));
}

#[test]
fn given_init_without_sections_when_decoded_then_starts_empty() {
    let init = InitPayload::from_value(json!({})).expect("sections are optional");

    assert!(init.attributes.is_empty());
    assert!(init.room_state.is_empty());
}

/// **VALUE**: Verifies that a non-object section is refused.
///
/// **BUG THIS CATCHES**: Would catch a handshake completing with a half-decoded state,
/// e.g. `attributes: "oops"` being silently replaced by an empty bag.
#[test]
fn given_init_with_non_object_attributes_when_decoded_then_returns_decode_error() {
    // GIVEN: A broken attributes section
    let raw = json!({"attributes": "oops", "roomState": {}});

    // WHEN: Decoding
    let result = InitPayload::from_value(raw);

    // THEN: Decode error
    assert!(matches!(result, Err(ModelError::Decode { .. })));
}

#[test]
fn given_init_payload_when_encoded_then_matches_wire_shape() {
    let mut init = InitPayload::default();
    init.attributes.insert("a".to_string(), json!(1));

    assert_eq!(
        init.into_value(),
        json!({"attributes": {"a": 1}, "roomState": {}})
    );
}
