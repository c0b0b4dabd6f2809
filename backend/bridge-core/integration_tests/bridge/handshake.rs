use crate::host_tests::helpers::{
    EMBED_ORIGIN, HOST_ORIGIN, connect, follower_room, window_pair,
};

use bridge_core::transport::local::LocalWindow;
use bridge_core::{BridgeError, BridgeOptions, MessagePort, create_bridge};
use models::MessageKind;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::{Instant, timeout};

// ============================================================================
// create_bridge() - handshake outcomes
// ============================================================================

/// **VALUE**: Verifies the happy path: one announcement, then a client seeded
/// from the host's `Init`.
///
/// **WHY THIS MATTERS**: Every other operation depends on the mirrors starting
/// from the host's state. A client built from partial or default state would
/// report wrong pages and misjudge follower mode.
#[tokio::test]
async fn given_host_replies_with_init_when_creating_bridge_then_client_is_seeded() {
    // GIVEN/WHEN: Host answers the announcement with Init
    let (mut host, client) = connect(
        json!({"totalPage": 5, "color": "red"}),
        json!({
            "broadcastState": {"mode": "broadcaster"},
            "sceneState": {"index": 1, "scenes": [{}, {}, {}]}
        }),
        BridgeOptions::default(),
    )
    .await;

    // THEN: Mirrors and derived reads reflect Init
    assert_eq!(client.attribute("color"), Some(json!("red")));
    assert!(!client.is_follower());
    assert_eq!(client.current_index(), Some(1));
    assert_eq!(client.current_page(), Some(2));
    assert_eq!(client.total_pages(), Some(3));
    assert_eq!(client.target_origin(), HOST_ORIGIN);

    // THEN: No second announcement
    host.assert_silent();
}

/// **VALUE**: Verifies the handshake fails after the configured bound when the
/// host never answers, and leaves no listener behind.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - the handshake waited forever
/// - the timeout fired early
/// - the transient subscription leaked after failure
#[tokio::test(start_paused = true)]
async fn given_silent_host_when_creating_bridge_then_times_out_after_bound() {
    // GIVEN: A host that never replies
    let (mut host, port) = window_pair();
    let started = Instant::now();

    // WHEN: Creating the bridge with the default 500ms bound
    let result = create_bridge(port, HOST_ORIGIN, BridgeOptions::default()).await;

    // THEN: HandshakeTimeout after ~500ms
    let elapsed = started.elapsed();
    assert!(
        matches!(result, Err(BridgeError::HandshakeTimeout { .. })),
        "Expected HandshakeTimeout, got {result:?}"
    );
    assert!(elapsed >= Duration::from_millis(500), "Fired early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(600), "Fired late: {elapsed:?}");

    // THEN: Exactly one announcement, and the listener was released
    let sent = host.take_sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, MessageKind::SdkCreate);
    assert_eq!(sent[0].payload, json!(true));
    assert_eq!(host.embedded_listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn given_custom_timeout_when_host_is_silent_then_uses_custom_bound() {
    let (_host, port) = window_pair();
    let options = BridgeOptions::default().with_handshake_timeout(Duration::from_millis(50));
    let started = Instant::now();

    let result = create_bridge(port, HOST_ORIGIN, options).await;

    assert!(matches!(result, Err(BridgeError::HandshakeTimeout { .. })));
    assert!(started.elapsed() < Duration::from_millis(500));
}

/// **VALUE**: Verifies that noise before `Init` is skipped, not fatal.
///
/// **WHY THIS MATTERS**: The channel is shared with whatever else the page
/// posts. Unknown tags, non-envelope values and a broken `Init` must not kill
/// the handshake when a valid `Init` follows.
#[tokio::test]
async fn given_noise_before_init_when_creating_bridge_then_ignores_it() {
    // GIVEN: A handshake in progress
    let (mut host, port) = window_pair();
    let pending = tokio::spawn(create_bridge(port, HOST_ORIGIN, BridgeOptions::default()));
    assert_eq!(host.expect_message().await.kind, MessageKind::SdkCreate);

    // WHEN: Noise arrives, then a valid Init
    host.send_raw(json!("not an envelope"));
    host.send_raw(json!({"kind": 42}));
    host.send(MessageKind::Other("Zoom".to_string()), json!(2));
    host.send(MessageKind::Init, json!({"attributes": "broken"}));
    host.send(MessageKind::Init, json!({"attributes": {"ok": true}, "roomState": {}}));

    // THEN: The handshake completes from the valid Init
    let client = pending
        .await
        .expect("Handshake task panicked")
        .expect("Handshake should succeed");
    assert_eq!(client.attribute("ok"), Some(json!(true)));
    host.assert_silent();
}

/// **VALUE**: Verifies `Init` from a non-matching origin is ignored.
///
/// **BUG THIS CATCHES**: Would catch a third-party frame completing the
/// handshake with forged state.
#[tokio::test(start_paused = true)]
async fn given_init_from_other_origin_when_creating_bridge_then_times_out() {
    // GIVEN: The embedded side's peer is not the expected host
    let (imposter, embedded) = LocalWindow::pair("https://evil.example.com", EMBED_ORIGIN);
    let port: Arc<dyn MessagePort> = Arc::new(embedded);
    let pending = tokio::spawn(create_bridge(port, HOST_ORIGIN, BridgeOptions::default()));
    tokio::task::yield_now().await;

    // WHEN: The imposter sends Init to any origin
    imposter
        .post_message(
            json!({"kind": "Init", "payload": {"attributes": {}, "roomState": {}}}),
            "*",
        )
        .expect("Local post should not fail");

    // THEN: The handshake still times out
    let result = pending.await.expect("Handshake task panicked");
    assert!(matches!(result, Err(BridgeError::HandshakeTimeout { .. })));
}

#[tokio::test]
async fn given_invalid_target_origin_when_creating_bridge_then_returns_invalid_origin() {
    let (mut host, port) = window_pair();

    let result = create_bridge(port, "not an origin", BridgeOptions::default()).await;

    assert!(matches!(result, Err(BridgeError::InvalidOrigin { .. })));
    host.assert_silent();
}

/// **VALUE**: Verifies a message sent right after `Init` reaches the client.
///
/// **BUG THIS CATCHES**: Would catch a gap between the handshake listener and
/// the client's own listener, where an early update would be lost.
#[tokio::test]
async fn given_update_right_after_init_when_creating_bridge_then_update_is_applied() {
    // GIVEN: A handshake in progress
    let (mut host, port) = window_pair();
    let pending = tokio::spawn(create_bridge(port, HOST_ORIGIN, BridgeOptions::default()));
    assert_eq!(host.expect_message().await.kind, MessageKind::SdkCreate);

    // WHEN: Init and an update are posted back to back
    host.send(MessageKind::Init, json!({"attributes": {}, "roomState": follower_room()}));
    host.send(MessageKind::AttributesUpdate, json!({"late": 1}));
    let client = pending
        .await
        .expect("Handshake task panicked")
        .expect("Handshake should succeed");

    // THEN: The update lands in the mirror
    timeout(Duration::from_secs(1), async {
        while client.attribute("late").is_none() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("Update after Init was lost");
    assert!(client.is_follower());
}

#[tokio::test]
async fn given_wildcard_origin_when_creating_bridge_then_accepts_host() {
    let (mut host, port) = window_pair();
    let pending = tokio::spawn(create_bridge(port, "*", BridgeOptions::default()));
    assert_eq!(host.expect_message().await.kind, MessageKind::SdkCreate);

    host.send(MessageKind::Init, json!({"attributes": {}, "roomState": {}}));

    let client = pending
        .await
        .expect("Handshake task panicked")
        .expect("Handshake should succeed");
    assert_eq!(client.target_origin(), "*");
}
