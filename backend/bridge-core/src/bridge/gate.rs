//! Follower gate for outbound control messages.
//!
//! While the room's broadcast mode is `"follower"` this participant must not
//! drive the host, so every outbound kind except listener bookkeeping is held
//! back.

use models::MessageKind;

/// Kinds that pass the gate even for a follower.
pub fn is_follower_exempt(kind: &MessageKind) -> bool {
    matches!(
        kind,
        MessageKind::RegisterMagixEvent
            | MessageKind::RemoveMagixEvent
            | MessageKind::RemoveAllMagixEvent
    )
}

pub fn admits(kind: &MessageKind, is_follower: bool) -> bool {
    !is_follower || is_follower_exempt(kind)
}
