use crate::RoomState;
use crate::room_state::{broadcast_mode, is_follower, scene_count, scene_index};

use serde_json::{Value, json};

fn room(value: Value) -> RoomState {
    match value {
        Value::Object(map) => map,
        other => panic!("test fixture must be an object, got {other}"),
    }
}

/// **VALUE**: Verifies the follower predicate reads `broadcastState.mode` exactly.
///
/// **WHY THIS MATTERS**: This predicate decides whether attribute writes, event dispatch
/// and navigation reach the host at all. A false positive mutes the presenter; a false
/// negative lets followers drive the room.
#[test]
fn given_room_states_when_checking_follower_then_only_follower_mode_matches() {
    // GIVEN: Several broadcast states
    let follower = room(json!({"broadcastState": {"mode": "follower"}}));
    let broadcaster = room(json!({"broadcastState": {"mode": "broadcaster"}}));
    let missing = room(json!({}));
    let wrong_type = room(json!({"broadcastState": {"mode": 1}}));

    // WHEN/THEN: Only the follower mode string counts
    assert!(is_follower(&follower));
    assert!(!is_follower(&broadcaster));
    assert!(!is_follower(&missing));
    assert!(!is_follower(&wrong_type));
    assert_eq!(broadcast_mode(&broadcaster), Some("broadcaster"));
}

#[test]
fn given_scene_state_when_reading_position_then_returns_index_and_count() {
    let state = room(json!({"sceneState": {"index": 2, "scenes": [{}, {}, {}, {}]}}));

    assert_eq!(scene_index(&state), Some(2));
    assert_eq!(scene_count(&state), Some(4));
}

#[test]
fn given_no_scene_state_when_reading_position_then_returns_none() {
    let state = room(json!({"broadcastState": {}}));

    assert_eq!(scene_index(&state), None);
    assert_eq!(scene_count(&state), None);
}
