use crate::transport::local::LocalWindow;
use crate::transport::{MessagePort, Subscribers, origin_matches};

use serde_json::json;

const PAGE: &str = "https://host.example.com";
const FRAME: &str = "https://embed.example.com";

#[test]
fn given_origins_when_matching_then_wildcard_or_equal_passes() {
    assert!(origin_matches("*", PAGE));
    assert!(origin_matches(PAGE, PAGE));
    assert!(!origin_matches(PAGE, FRAME));
}

/// **VALUE**: Verifies the in-process window pair behaves like `postMessage`:
/// delivery to the peer only, tagged with the sender's origin.
#[tokio::test]
async fn given_window_pair_when_posting_then_peer_receives_with_sender_origin() {
    // GIVEN: A host window and an embedded window
    let (host, embedded) = LocalWindow::pair(PAGE, FRAME);
    let mut host_inbox = host.subscribe();
    let mut embedded_inbox = embedded.subscribe();

    // WHEN: The embedded window posts to the host origin
    embedded
        .post_message(json!({"kind": "SDKCreate"}), PAGE)
        .expect("local post cannot fail");

    // THEN: Only the host sees it, tagged with the embedded origin
    let received = host_inbox.try_recv().expect("host should receive");
    assert_eq!(received.origin, FRAME);
    assert_eq!(received.data, json!({"kind": "SDKCreate"}));
    assert!(embedded_inbox.try_recv().is_none());
}

#[tokio::test]
async fn given_mismatched_target_origin_when_posting_then_message_is_dropped() {
    let (host, embedded) = LocalWindow::pair(PAGE, FRAME);
    let mut host_inbox = host.subscribe();

    embedded
        .post_message(json!(1), "https://elsewhere.example.com")
        .expect("mismatch is silent");

    assert!(host_inbox.try_recv().is_none());
}

#[tokio::test]
async fn given_released_subscription_when_receiving_then_ends() {
    // GIVEN: A subscription on the host window
    let (host, embedded) = LocalWindow::pair(PAGE, FRAME);
    let mut inbox = host.subscribe();
    assert_eq!(embedded.peer_listener_count(), 1);

    // WHEN: It is released
    host.unsubscribe(inbox.id());

    // THEN: No listener remains and the receiver ends
    assert_eq!(host.listener_count(), 0);
    assert!(inbox.recv().await.is_none());
}

#[tokio::test]
async fn given_closed_subscribers_when_subscribing_then_subscription_ends_immediately() {
    let subscribers = Subscribers::default();
    subscribers.close();

    let mut subscription = subscribers.subscribe();

    assert_eq!(subscribers.len(), 0);
    assert!(subscription.recv().await.is_none());
}
