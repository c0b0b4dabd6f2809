use crate::host_tests::helpers::{
    capture_magix, capture_state, connect, connect_default, envelope, follower_room, next_value,
};

use bridge_core::{BridgeOptions, StateEvent};
use models::{MessageKind, Patch};

use serde_json::json;

/// **VALUE**: Verifies a follower cannot drive the host: attribute writes,
/// event dispatch and navigation all go nowhere.
///
/// **WHY THIS MATTERS**: Follower mode exists so only the presenter moves the
/// room. Any leak lets a viewer flip pages for everyone.
///
/// **BUG THIS CATCHES**: Would catch a gated call that reaches the host, or an
/// optimistic write applied even though the request was suppressed.
#[tokio::test]
async fn given_follower_when_calling_gated_operations_then_host_receives_nothing() {
    // GIVEN: A follower with optimistic writes on
    let options = BridgeOptions::default().with_optimistic_local_writes(true);
    let (mut host, client) = connect(json!({}), follower_room(), options).await;
    assert!(client.is_follower());

    // WHEN: Calling every gated operation
    client.set_attributes(Patch::new().set("color", "red"));
    client.dispatch_magix_event("draw", json!({}));
    client.next_page();
    client.prev_page();

    // THEN: Nothing sent, nothing applied locally
    host.assert_silent();
    assert_eq!(client.attribute("color"), None);
}

/// **VALUE**: Verifies listener bookkeeping still reaches the host while
/// following, so the follower keeps receiving broadcast events.
#[tokio::test]
async fn given_follower_when_registering_and_removing_listener_then_host_is_told() {
    // GIVEN: A follower
    let (mut host, client) = connect(json!({}), follower_room(), BridgeOptions::default()).await;

    // WHEN: Adding then removing a listener
    let (id, _rx) = capture_magix(&client, "draw");
    client
        .remove_magix_event_listener("draw", id)
        .expect("listener is attached");

    // THEN: Both bookkeeping messages were sent
    assert_eq!(
        host.take_sent(),
        vec![
            envelope(MessageKind::RegisterMagixEvent, json!("draw")),
            envelope(MessageKind::RemoveMagixEvent, json!("draw")),
        ]
    );
}

/// **VALUE**: Verifies the gate reads the mirror at send time, so it tracks
/// follower transitions pushed by the host.
///
/// **BUG THIS CATCHES**: Would catch a follower flag cached at handshake time.
#[tokio::test]
async fn given_mode_changes_when_navigating_then_gate_follows_room_state() {
    // GIVEN: A broadcaster
    let (mut host, client) = connect_default().await;
    let mut changes = capture_state(&client, StateEvent::RoomStateChanged);

    // WHEN: The host switches this client to follower
    host.send(MessageKind::RoomStateChanged, follower_room());
    next_value(&mut changes).await;
    client.next_page();

    // THEN: Suppressed
    host.assert_silent();

    // WHEN: Switched back to broadcaster
    host.send(
        MessageKind::RoomStateChanged,
        json!({"broadcastState": {"mode": "broadcaster"}}),
    );
    next_value(&mut changes).await;
    client.next_page();

    // THEN: Sent again
    assert_eq!(host.expect_message().await, envelope(MessageKind::NextPage, json!(true)));
}

#[tokio::test]
async fn given_follower_when_destroying_then_remove_all_is_still_sent() {
    let (mut host, client) = connect(json!({}), follower_room(), BridgeOptions::default()).await;

    client.destroy().expect("first destroy succeeds");

    assert_eq!(
        host.take_sent(),
        vec![envelope(MessageKind::RemoveAllMagixEvent, json!(true))]
    );
}

#[tokio::test]
async fn given_follower_when_host_sends_updates_then_mirror_still_follows() {
    let (host, client) = connect(json!({}), follower_room(), BridgeOptions::default()).await;
    let mut updates = capture_state(&client, StateEvent::AttributesUpdate);

    host.send(MessageKind::AttributesUpdate, json!({"page": 3}));

    assert_eq!(next_value(&mut updates).await, json!({"page": 3}));
    assert_eq!(client.attribute("page"), Some(json!(3)));
}
