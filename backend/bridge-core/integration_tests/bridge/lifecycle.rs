use crate::host_tests::helpers::{
    assert_no_value, capture_magix, capture_state, connect_default, envelope, next_value,
};

use bridge_core::{BridgeError, StateEvent};
use models::{MessageKind, Patch};

use serde_json::{Value, json};
use tokio::sync::mpsc::unbounded_channel;

/// **VALUE**: Verifies teardown releases everything and tells the host once.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - the inbound subscription survived `destroy`
/// - local listeners or registration counts survived
/// - `RemoveAllMagixEvent` was not sent
#[tokio::test]
async fn given_live_client_when_destroyed_then_releases_listeners_and_notifies_host() {
    // GIVEN: A client with Magix listeners
    let (mut host, client) = connect_default().await;
    let (_draw, _draw_rx) = capture_magix(&client, "draw");
    let (_erase, _erase_rx) = capture_magix(&client, "erase");
    host.take_sent();
    assert_eq!(host.embedded_listener_count(), 1);

    // WHEN: Destroying
    client.destroy().expect("first destroy succeeds");

    // THEN: Everything released, host told
    assert!(client.is_destroyed());
    assert_eq!(host.embedded_listener_count(), 0);
    assert_eq!(client.magix_listener_count("draw"), 0);
    assert_eq!(client.magix_listener_count("erase"), 0);
    assert_eq!(
        host.take_sent(),
        vec![envelope(MessageKind::RemoveAllMagixEvent, json!(true))]
    );
}

#[tokio::test]
async fn given_destroyed_client_when_destroyed_again_then_returns_double_destroy() {
    // GIVEN: A destroyed client
    let (mut host, client) = connect_default().await;
    client.destroy().expect("first destroy succeeds");
    host.take_sent();

    // WHEN: Destroying again
    let result = client.destroy();

    // THEN: DoubleDestroy and no second RemoveAll
    assert!(matches!(result, Err(BridgeError::DoubleDestroy { .. })));
    host.assert_silent();
}

/// **VALUE**: Verifies a destroyed client neither reacts to the host nor
/// talks to it.
#[tokio::test]
async fn given_destroyed_client_when_used_then_is_inert() {
    // GIVEN: A destroyed client that had a state listener
    let (mut host, client) = connect_default().await;
    let mut updates = capture_state(&client, StateEvent::AttributesUpdate);
    client.destroy().expect("first destroy succeeds");
    host.take_sent();

    // WHEN: The host sends an update and the client is used
    host.send(MessageKind::AttributesUpdate, json!({"after": true}));
    client.set_attributes(Patch::new().set("a", 1));
    client.next_page();
    client.dispatch_magix_event("draw", json!({}));
    let added = client.add_magix_event_listener("draw", |_| {});

    // THEN: No mirror change, no notification, nothing sent, registration refused
    assert_no_value(&mut updates).await;
    assert_eq!(client.attribute("after"), None);
    host.assert_silent();
    assert!(matches!(added, Err(BridgeError::Destroyed { .. })));
}

/// **VALUE**: Verifies a listener may tear the bridge down while it is being
/// notified.
///
/// **BUG THIS CATCHES**: Would catch a deadlock from holding a client lock
/// across handler calls.
#[tokio::test]
async fn given_handler_that_destroys_client_when_notified_then_teardown_completes() {
    // GIVEN: A handler that destroys the client it listens on
    let (mut host, client) = connect_default().await;
    let (done_sender, mut done) = unbounded_channel();
    let handle = client.clone();
    client.on(StateEvent::AttributesUpdate, move |_| {
        let outcome = handle.destroy().is_ok();
        let _ = done_sender.send(json!(outcome));
    });
    host.take_sent();

    // WHEN: An update triggers it
    host.send(MessageKind::AttributesUpdate, json!({"bye": true}));

    // THEN: Destroy succeeded and the host was told
    assert_eq!(next_value(&mut done).await, json!(true));
    assert!(client.is_destroyed());
    assert_eq!(
        host.expect_message().await,
        envelope(MessageKind::RemoveAllMagixEvent, json!(true))
    );
}

/// **VALUE**: Verifies dropping the last handle without `destroy` still
/// releases the subscription and unregisters on the host.
#[tokio::test]
async fn given_client_dropped_without_destroy_when_dropped_then_tears_down() {
    // GIVEN: A client with a listener
    let (mut host, client) = connect_default().await;
    let (_id, _rx) = capture_magix(&client, "draw");
    host.take_sent();

    // WHEN: Dropping every handle
    drop(client);

    // THEN: Subscription gone, host told
    assert_eq!(host.embedded_listener_count(), 0);
    assert_eq!(
        host.take_sent(),
        vec![envelope(MessageKind::RemoveAllMagixEvent, json!(true))]
    );
}

#[tokio::test]
async fn given_destroyed_client_when_removing_listener_then_returns_destroyed() {
    let (_host, client) = connect_default().await;
    let (id, _rx) = capture_magix(&client, "draw");
    client.destroy().expect("first destroy succeeds");

    let result = client.remove_magix_event_listener("draw", id);

    assert!(matches!(result, Err(BridgeError::Destroyed { .. })));
}

/// **VALUE**: Verifies a listener can reach its client through a weak handle
/// without blocking drop-time teardown.
///
/// **BUG THIS CATCHES**: Would catch the weak handle keeping the client alive,
/// which leaks the subscription and never unregisters on the host.
#[tokio::test]
async fn given_listener_holding_weak_handle_when_last_handle_dropped_then_tears_down() {
    // GIVEN: A listener that reads the client through a weak handle
    let (mut host, client) = connect_default().await;
    let (seen_sender, mut seen) = unbounded_channel();
    let weak = client.downgrade();
    client.on(StateEvent::AttributesUpdate, move |_| {
        let page = weak.upgrade().and_then(|client| client.attribute("page"));
        let _ = seen_sender.send(page.unwrap_or(Value::Null));
    });
    host.send(MessageKind::AttributesUpdate, json!({"page": 2}));
    assert_eq!(next_value(&mut seen).await, json!(2));
    host.take_sent();

    // WHEN: Dropping every strong handle
    drop(client);

    // THEN: Host told (teardown may finish on the inbound task), subscription gone
    assert_eq!(
        host.expect_message().await,
        envelope(MessageKind::RemoveAllMagixEvent, json!(true))
    );
    assert_eq!(host.embedded_listener_count(), 0);
    host.assert_silent();
}

#[tokio::test]
async fn given_dropped_client_when_upgrading_weak_handle_then_returns_none() {
    let (_host, client) = connect_default().await;
    let weak = client.downgrade();

    drop(client);

    assert!(weak.upgrade().is_none());
}
