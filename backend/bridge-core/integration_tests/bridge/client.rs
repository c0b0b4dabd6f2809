use crate::host_tests::helpers::{
    assert_no_value, capture_magix, capture_state, connect, connect_default, envelope,
    next_value,
};

use bridge_core::{BridgeError, BridgeOptions, StateEvent};
use models::{MessageKind, Patch};

use serde_json::{Value, json};

// ============================================================================
// Inbound dispatch
// ============================================================================

/// **VALUE**: Verifies `AttributesUpdate` patches the mirror (null deletes,
/// others overwrite, the rest untouched) and notifies with the raw patch.
///
/// **WHY THIS MATTERS**: Listeners diff against the patch they receive. If they
/// got the merged bag instead, or were called before the merge, they would
/// render stale or duplicated state.
#[tokio::test]
async fn given_attributes_update_when_received_then_mirror_is_patched_and_listeners_get_patch() {
    // GIVEN: A client with some attributes and a listener
    let (host, client) = connect(
        json!({"keep": 1, "drop": 2, "change": 3}),
        json!({}),
        BridgeOptions::default(),
    )
    .await;
    let mut updates = capture_state(&client, StateEvent::AttributesUpdate);

    // WHEN: The host sends a patch
    let patch = json!({"drop": null, "change": 30, "add": 4});
    host.send(MessageKind::AttributesUpdate, patch.clone());

    // THEN: Listener receives the raw patch; mirror follows the merge rule
    assert_eq!(next_value(&mut updates).await, patch);
    assert_eq!(
        Value::Object(client.attributes()),
        json!({"keep": 1, "change": 30, "add": 4})
    );
}

#[tokio::test]
async fn given_set_attributes_echo_when_received_then_is_treated_as_update() {
    let (host, client) = connect_default().await;
    let mut updates = capture_state(&client, StateEvent::AttributesUpdate);

    host.send(MessageKind::SetAttributes, json!({"echoed": true}));

    assert_eq!(next_value(&mut updates).await, json!({"echoed": true}));
    assert_eq!(client.attribute("echoed"), Some(json!(true)));
}

#[tokio::test]
async fn given_room_state_change_when_received_then_pages_follow() {
    // GIVEN: A client on the first of two scenes
    let (host, client) = connect(
        json!({}),
        json!({"sceneState": {"index": 0, "scenes": [{}, {}]}}),
        BridgeOptions::default(),
    )
    .await;
    let mut changes = capture_state(&client, StateEvent::RoomStateChanged);

    // WHEN: The host moves to the second scene
    let patch = json!({"sceneState": {"index": 1, "scenes": [{}, {}]}});
    host.send(MessageKind::RoomStateChanged, patch.clone());

    // THEN: Notified with the patch; page reads follow
    assert_eq!(next_value(&mut changes).await, patch);
    assert_eq!(client.current_page(), Some(2));
    assert_eq!(client.total_pages(), Some(2));
}

/// **VALUE**: Verifies the full Magix path: local listener registers with the
/// host, host delivers an event, the handler receives its payload.
#[tokio::test]
async fn given_registered_listener_when_host_delivers_magix_event_then_handler_gets_payload() {
    // GIVEN: A listener for "draw"
    let (mut host, client) = connect_default().await;
    let (_id, mut draws) = capture_magix(&client, "draw");
    let registered = host.expect_message().await;
    assert_eq!(registered, envelope(MessageKind::RegisterMagixEvent, json!("draw")));

    // WHEN: The host delivers a draw event
    host.send(
        MessageKind::ReciveMagixEvent,
        json!({"event": "draw", "payload": {"x": 1, "y": 2}}),
    );

    // THEN: The handler receives the inner payload
    assert_eq!(next_value(&mut draws).await, json!({"x": 1, "y": 2}));
}

/// **VALUE**: Verifies inbound garbage is dropped without stopping dispatch.
///
/// **BUG THIS CATCHES**: Would catch the inbound task exiting (or panicking) on
/// the first malformed message, which would silently freeze the mirrors.
#[tokio::test]
async fn given_malformed_and_unknown_messages_when_received_then_later_messages_still_apply() {
    // GIVEN: A client with a listener
    let (host, client) = connect_default().await;
    let mut updates = capture_state(&client, StateEvent::AttributesUpdate);

    // WHEN: Garbage, then a valid update
    host.send_raw(json!("garbage"));
    host.send_raw(json!({"payload": {}}));
    host.send(MessageKind::Other("ZoomChanged".to_string()), json!(3));
    host.send(MessageKind::AttributesUpdate, json!(5));
    host.send(MessageKind::ReciveMagixEvent, json!({"event": "nobody", "payload": 1}));
    host.send(MessageKind::ReciveMagixEvent, json!("broken"));
    host.send(MessageKind::AttributesUpdate, json!({"valid": true}));

    // THEN: Only the valid update is seen
    assert_eq!(next_value(&mut updates).await, json!({"valid": true}));
    assert_no_value(&mut updates).await;
    assert_eq!(Value::Object(client.attributes()), json!({"valid": true}));
}

/// **VALUE**: Verifies a panicking listener does not stop inbound processing.
///
/// **BUG THIS CATCHES**: Would catch a listener panic unwinding through the
/// inbound task, after which no host message is ever applied again while the
/// client still reports itself live.
#[tokio::test]
async fn given_panicking_state_listener_when_more_messages_arrive_then_they_still_apply() {
    // GIVEN: A room-state listener that panics, and an attributes listener
    let (host, client) = connect_default().await;
    client.on(StateEvent::RoomStateChanged, |_| panic!("listener failed"));
    let mut updates = capture_state(&client, StateEvent::AttributesUpdate);

    // WHEN: A room-state change, then an attributes update
    host.send(MessageKind::RoomStateChanged, json!({"x": 1}));
    host.send(MessageKind::AttributesUpdate, json!({"after": true}));

    // THEN: Both were applied and the update was announced
    assert_eq!(next_value(&mut updates).await, json!({"after": true}));
    assert_eq!(client.attribute("after"), Some(json!(true)));
    assert_eq!(client.room_state().get("x"), Some(&json!(1)));
    assert!(!client.is_destroyed());
}

#[tokio::test]
async fn given_detached_state_listener_when_update_arrives_then_it_is_not_called() {
    let (host, client) = connect_default().await;
    let id = client.on(StateEvent::AttributesUpdate, |_| panic!("should be detached"));
    let mut witness = capture_state(&client, StateEvent::AttributesUpdate);

    assert!(client.off(StateEvent::AttributesUpdate, id));
    host.send(MessageKind::AttributesUpdate, json!({"a": 1}));

    assert_eq!(next_value(&mut witness).await, json!({"a": 1}));
}

// ============================================================================
// Outbound requests
// ============================================================================

/// **VALUE**: Verifies `set_attributes` only requests the change; the mirror
/// moves when the host echoes it.
///
/// **WHY THIS MATTERS**: The host is authoritative and may reject or rewrite
/// the patch. Applying it locally first would show state the room never had.
#[tokio::test]
async fn given_default_options_when_setting_attributes_then_mirror_waits_for_echo() {
    // GIVEN: A client with an attribute
    let (mut host, client) = connect(json!({"stale": 1}), json!({}), BridgeOptions::default()).await;
    let mut updates = capture_state(&client, StateEvent::AttributesUpdate);

    // WHEN: Requesting a change
    client.set_attributes(Patch::new().set("color", "blue").remove("stale"));

    // THEN: The request uses the absent marker; the mirror is unchanged
    let sent = host.expect_message().await;
    assert_eq!(
        sent,
        envelope(MessageKind::SetAttributes, json!({"color": "blue", "stale": null}))
    );
    assert_eq!(client.attribute("color"), None);
    assert_eq!(client.attribute("stale"), Some(json!(1)));

    // WHEN: The host echoes it
    host.send(MessageKind::SetAttributes, sent.payload);

    // THEN: Now the mirror moves
    next_value(&mut updates).await;
    assert_eq!(client.attribute("color"), Some(json!("blue")));
    assert_eq!(client.attribute("stale"), None);
}

#[tokio::test]
async fn given_optimistic_writes_when_setting_attributes_then_mirror_updates_without_notification() {
    // GIVEN: Optimistic writes enabled
    let options = BridgeOptions::default().with_optimistic_local_writes(true);
    let (mut host, client) = connect(json!({}), json!({}), options).await;
    let mut updates = capture_state(&client, StateEvent::AttributesUpdate);

    // WHEN: Requesting a change
    client.set_attributes(Patch::new().set("color", "blue"));

    // THEN: Applied locally right away and still sent; no local notification
    assert_eq!(client.attribute("color"), Some(json!("blue")));
    assert_eq!(host.expect_message().await.kind, MessageKind::SetAttributes);
    assert_no_value(&mut updates).await;
}

#[tokio::test]
async fn given_magix_event_when_dispatching_then_host_receives_event_and_payload() {
    let (mut host, client) = connect_default().await;

    client.dispatch_magix_event("draw", json!({"x": 1}));

    assert_eq!(
        host.expect_message().await,
        envelope(
            MessageKind::DispatchMagixEvent,
            json!({"event": "draw", "payload": {"x": 1}})
        )
    );
}

/// **VALUE**: Verifies navigation is always forwarded, even past the last page.
///
/// **WHY THIS MATTERS**: The local scene index may be stale. The host owns the
/// bounds, so the bridge must not second-guess it.
#[tokio::test]
async fn given_last_page_when_requesting_next_then_request_is_still_sent() {
    // GIVEN: A client on the last of two scenes
    let (mut host, client) = connect(
        json!({}),
        json!({"sceneState": {"index": 1, "scenes": [{}, {}]}}),
        BridgeOptions::default(),
    )
    .await;

    // WHEN: Navigating past both ends
    client.next_page();
    client.prev_page();

    // THEN: Both requests reach the host
    assert_eq!(host.expect_message().await, envelope(MessageKind::NextPage, json!(true)));
    assert_eq!(host.expect_message().await, envelope(MessageKind::PrevPage, json!(true)));
}

// ============================================================================
// Magix listener reference counting
// ============================================================================

/// **VALUE**: Verifies remote (un)registration happens only on the first add
/// and the last remove for a name.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - every listener sent its own `RegisterMagixEvent`
/// - removing one of two listeners unregistered the name on the host
/// - the last removal forgot `RemoveMagixEvent`
#[tokio::test]
async fn given_two_listeners_when_removing_both_then_host_sees_one_register_and_one_remove() {
    // GIVEN: Two listeners for the same name
    let (mut host, client) = connect_default().await;
    let (first, _first_rx) = capture_magix(&client, "nextPage");
    let (second, _second_rx) = capture_magix(&client, "nextPage");

    // THEN: One registration
    let sent = host.take_sent();
    assert_eq!(sent, vec![envelope(MessageKind::RegisterMagixEvent, json!("nextPage"))]);
    assert_eq!(client.magix_listener_count("nextPage"), 2);

    // WHEN: Removing the first
    client
        .remove_magix_event_listener("nextPage", first)
        .expect("first listener is attached");

    // THEN: Host not told yet
    host.assert_silent();
    assert_eq!(client.magix_listener_count("nextPage"), 1);

    // WHEN: Removing the second
    client
        .remove_magix_event_listener("nextPage", second)
        .expect("second listener is attached");

    // THEN: One removal
    assert_eq!(
        host.take_sent(),
        vec![envelope(MessageKind::RemoveMagixEvent, json!("nextPage"))]
    );
    assert_eq!(client.magix_listener_count("nextPage"), 0);
}

#[tokio::test]
async fn given_unregistered_name_when_removing_listener_then_errors_without_message() {
    // GIVEN: A listener for a different name
    let (mut host, client) = connect_default().await;
    let (id, _rx) = capture_magix(&client, "draw");
    host.take_sent();

    // WHEN: Removing it under a name never registered
    let result = client.remove_magix_event_listener("erase", id);

    // THEN: UnregisteredListener, nothing sent, original still registered
    assert!(matches!(result, Err(BridgeError::UnregisteredListener { .. })));
    host.assert_silent();
    assert_eq!(client.magix_listener_count("draw"), 1);
}

#[tokio::test]
async fn given_foreign_listener_id_when_removing_then_errors_and_keeps_count() {
    let (mut host, client) = connect_default().await;
    let (_draw, _draw_rx) = capture_magix(&client, "draw");
    let (erase, _erase_rx) = capture_magix(&client, "erase");
    host.take_sent();

    let result = client.remove_magix_event_listener("draw", erase);

    assert!(matches!(result, Err(BridgeError::UnregisteredListener { .. })));
    host.assert_silent();
    assert_eq!(client.magix_listener_count("draw"), 1);
    assert_eq!(client.magix_listener_count("erase"), 1);
}

#[tokio::test]
async fn given_removed_listener_when_event_arrives_then_it_is_not_called() {
    let (host, client) = connect_default().await;
    let (removed, mut removed_rx) = capture_magix(&client, "draw");
    let (_kept, mut kept_rx) = capture_magix(&client, "draw");
    client
        .remove_magix_event_listener("draw", removed)
        .expect("listener is attached");

    host.send(MessageKind::ReciveMagixEvent, json!({"event": "draw", "payload": 7}));

    assert_eq!(next_value(&mut kept_rx).await, json!(7));
    assert_no_value(&mut removed_rx).await;
}
