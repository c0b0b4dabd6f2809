//! Accessors over the mirrored room-state snapshot.
//!
//! The snapshot stays an open JSON object; only the few paths the bridge
//! acts on are read here.

use serde_json::{Map, Value};

/// Host presentation state mirrored by the bridge.
pub type RoomState = Map<String, Value>;

/// Broadcast mode value that forbids this participant from driving the host.
pub const FOLLOWER_MODE: &str = "follower";

const BROADCAST_STATE_KEY: &str = "broadcastState";
const MODE_KEY: &str = "mode";
const SCENE_STATE_KEY: &str = "sceneState";
const INDEX_KEY: &str = "index";
const SCENES_KEY: &str = "scenes";

/// `broadcastState.mode`, if present and a string.
pub fn broadcast_mode(room_state: &RoomState) -> Option<&str> {
    room_state
        .get(BROADCAST_STATE_KEY)?
        .get(MODE_KEY)?
        .as_str()
}

pub fn is_follower(room_state: &RoomState) -> bool {
    broadcast_mode(room_state) == Some(FOLLOWER_MODE)
}

/// Zero-based `sceneState.index`.
pub fn scene_index(room_state: &RoomState) -> Option<u64> {
    room_state.get(SCENE_STATE_KEY)?.get(INDEX_KEY)?.as_u64()
}

/// Length of `sceneState.scenes`.
pub fn scene_count(room_state: &RoomState) -> Option<u64> {
    room_state
        .get(SCENE_STATE_KEY)?
        .get(SCENES_KEY)?
        .as_array()
        .map(|scenes| scenes.len() as u64)
}
