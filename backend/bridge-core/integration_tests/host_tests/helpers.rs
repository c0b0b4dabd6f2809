//! Test helpers for bridge integration tests.
//!
//! This module provides a scripted host peer on an in-process window pair:
//! - Completing the handshake
//! - Sending tagged or raw messages to the embedded side
//! - Reading what the embedded side posted
//! - Capturing listener notifications

use bridge_core::transport::local::LocalWindow;
use bridge_core::{
    BridgeClient, BridgeOptions, ListenerId, MessagePort, StateEvent, Subscription,
    create_bridge,
};
use models::{Envelope, MessageKind};

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::time::timeout;

/// Origin of the embedded document under test.
pub const EMBED_ORIGIN: &str = "https://embed.example.com";
/// Origin of the scripted host page.
pub const HOST_ORIGIN: &str = "https://host.example.com";

const RECV_TIMEOUT: Duration = Duration::from_secs(1);
const QUIET_PERIOD: Duration = Duration::from_millis(100);

/// Host side of a window pair, with a subscription on everything the
/// embedded side posts.
pub struct FakeHost {
    pub window: LocalWindow,
    inbox: Subscription,
}

impl FakeHost {
    pub fn send(&self, kind: MessageKind, payload: Value) {
        self.send_raw(Envelope::new(kind, payload).into_value());
    }

    pub fn send_raw(&self, data: Value) {
        self.window
            .post_message(data, EMBED_ORIGIN)
            .expect("Local post should not fail");
    }

    /// Next message the embedded side posted.
    pub async fn expect_message(&mut self) -> Envelope {
        let message = timeout(RECV_TIMEOUT, self.inbox.recv())
            .await
            .expect("Timed out waiting for embedded message")
            .expect("Embedded channel closed");

        assert_eq!(message.origin, EMBED_ORIGIN);
        Envelope::from_value(message.data).expect("Embedded side posted a malformed envelope")
    }

    /// Everything the embedded side has posted so far.
    pub fn take_sent(&mut self) -> Vec<Envelope> {
        let mut sent = Vec::new();
        while let Some(message) = self.inbox.try_recv() {
            sent.push(Envelope::from_value(message.data).expect("malformed envelope"));
        }
        sent
    }

    pub fn assert_silent(&mut self) {
        let sent = self.take_sent();
        assert!(sent.is_empty(), "Expected no messages, got {sent:?}");
    }

    /// Subscriptions attached to the embedded window.
    pub fn embedded_listener_count(&self) -> usize {
        self.window.peer_listener_count()
    }
}

pub fn window_pair() -> (FakeHost, Arc<dyn MessagePort>) {
    let (host, embedded) = LocalWindow::pair(HOST_ORIGIN, EMBED_ORIGIN);
    let inbox = host.subscribe();
    (FakeHost { window: host, inbox }, Arc::new(embedded))
}

/// Complete a handshake with the given initial state.
pub async fn connect(
    attributes: Value,
    room_state: Value,
    options: BridgeOptions,
) -> (FakeHost, BridgeClient) {
    let (mut host, port) = window_pair();
    let pending = tokio::spawn(create_bridge(port, HOST_ORIGIN, options));

    let announcement = host.expect_message().await;
    assert_eq!(announcement.kind, MessageKind::SdkCreate);
    host.send(
        MessageKind::Init,
        json!({"attributes": attributes, "roomState": room_state}),
    );

    let client = pending
        .await
        .expect("Handshake task panicked")
        .expect("Handshake should succeed");
    (host, client)
}

/// Handshake as a broadcaster with empty attributes.
pub async fn connect_default() -> (FakeHost, BridgeClient) {
    connect(
        json!({}),
        json!({"broadcastState": {"mode": "broadcaster"}}),
        BridgeOptions::default(),
    )
    .await
}

pub fn follower_room() -> Value {
    json!({"broadcastState": {"mode": "follower"}})
}

pub fn capture_state(client: &BridgeClient, event: StateEvent) -> UnboundedReceiver<Value> {
    let (sender, receiver) = unbounded_channel();
    client.on(event, move |value| {
        let _ = sender.send(value.clone());
    });
    receiver
}

pub fn capture_magix(client: &BridgeClient, event: &str) -> (ListenerId, UnboundedReceiver<Value>) {
    let (sender, receiver) = unbounded_channel();
    let id = client
        .add_magix_event_listener(event, move |value| {
            let _ = sender.send(value.clone());
        })
        .expect("Listener registration should succeed");
    (id, receiver)
}

pub async fn next_value(receiver: &mut UnboundedReceiver<Value>) -> Value {
    timeout(RECV_TIMEOUT, receiver.recv())
        .await
        .expect("Timed out waiting for notification")
        .expect("Notification channel closed")
}

/// Passes if nothing arrives within a short quiet period (or the channel ends).
pub async fn assert_no_value(receiver: &mut UnboundedReceiver<Value>) {
    match timeout(QUIET_PERIOD, receiver.recv()).await {
        Err(_) | Ok(None) => {}
        Ok(Some(value)) => panic!("Expected no notification, got {value}"),
    }
}

pub fn envelope(kind: MessageKind, payload: Value) -> Envelope {
    Envelope::new(kind, payload)
}
