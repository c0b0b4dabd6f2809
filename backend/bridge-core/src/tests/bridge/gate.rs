use crate::bridge::gate::{admits, is_follower_exempt};

use models::MessageKind;

/// **VALUE**: Verifies the follower gate holds back every host-driving kind
/// while letting listener bookkeeping through.
///
/// **WHY THIS MATTERS**: A follower that could still send `NextPage` or
/// `SetAttributes` would fight the presenter for control of the room. A follower
/// that could not send `RemoveAllMagixEvent` would leak host registrations.
#[test]
fn given_follower_when_checking_gate_then_only_registration_kinds_pass() {
    // GIVEN: Gated and exempt kinds
    let gated = [
        MessageKind::SetAttributes,
        MessageKind::DispatchMagixEvent,
        MessageKind::NextPage,
        MessageKind::PrevPage,
    ];
    let exempt = [
        MessageKind::RegisterMagixEvent,
        MessageKind::RemoveMagixEvent,
        MessageKind::RemoveAllMagixEvent,
    ];

    // WHEN/THEN: Follower mode splits them
    for kind in &gated {
        assert!(!admits(kind, true), "{kind} should be gated for a follower");
        assert!(!is_follower_exempt(kind));
    }
    for kind in &exempt {
        assert!(admits(kind, true), "{kind} should pass for a follower");
    }
}

#[test]
fn given_non_follower_when_checking_gate_then_everything_passes() {
    assert!(admits(&MessageKind::NextPage, false));
    assert!(admits(&MessageKind::SetAttributes, false));
    assert!(admits(&MessageKind::RemoveAllMagixEvent, false));
}
