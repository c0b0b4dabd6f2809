use crate::host_tests::helpers::next_value;

use bridge_core::transport::ws::WsPort;
use bridge_core::{BridgeError, BridgeOptions, TransportError, create_bridge};
use models::{Envelope, MessageKind};

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::unbounded_channel;
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::Message};

// ============================================================================
// Scripted WebSocket host
// ============================================================================

async fn bind_host() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test host");
    let address = listener.local_addr().expect("Bound listener has an address");
    (listener, format!("ws://{address}"))
}

async fn accept_host(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.expect("Failed to accept");
    accept_async(stream)
        .await
        .expect("WebSocket upgrade failed")
}

async fn recv_envelope(ws: &mut WebSocketStream<TcpStream>) -> Envelope {
    loop {
        let frame = ws
            .next()
            .await
            .expect("Embedded side closed the socket")
            .expect("Error receiving frame");
        if let Message::Text(text) = frame {
            let value: Value = serde_json::from_str(text.as_str()).expect("Frame is not JSON");
            return Envelope::from_value(value).expect("Frame is not an envelope");
        }
    }
}

async fn send_envelope(ws: &mut WebSocketStream<TcpStream>, kind: MessageKind, payload: Value) {
    let text = Envelope::new(kind, payload).into_value().to_string();
    ws.send(Message::Text(text.into()))
        .await
        .expect("Failed to send frame");
}

// ============================================================================
// WsPort
// ============================================================================

/// **VALUE**: Verifies the whole protocol over a real socket: handshake, Magix
/// registration and delivery, navigation, teardown.
///
/// **WHY THIS MATTERS**: `WsPort` is how out-of-process hosts talk to the
/// bridge. Framing or origin tagging mistakes would make every handshake time
/// out even though the in-process tests pass.
#[tokio::test]
async fn given_ws_host_when_running_session_then_messages_flow_both_ways() {
    // GIVEN: A scripted host on an ephemeral port
    let (listener, url) = bind_host().await;
    let host = tokio::spawn(async move {
        let mut ws = accept_host(&listener).await;
        let mut seen = Vec::new();

        seen.push(recv_envelope(&mut ws).await);
        ws.send(Message::Text("not json".to_string().into()))
            .await
            .expect("Failed to send frame");
        send_envelope(
            &mut ws,
            MessageKind::Init,
            json!({"attributes": {"totalPage": 4}, "roomState": {}}),
        )
        .await;

        let registered = recv_envelope(&mut ws).await;
        seen.push(registered);
        send_envelope(
            &mut ws,
            MessageKind::ReciveMagixEvent,
            json!({"event": "draw", "payload": {"x": 1}}),
        )
        .await;

        seen.push(recv_envelope(&mut ws).await);
        seen.push(recv_envelope(&mut ws).await);
        seen
    });

    // WHEN: The embedded side connects and runs a short session
    let port = WsPort::connect(&url).await.expect("Failed to connect");
    let origin = port.peer_origin().to_string();
    let client = create_bridge(Arc::new(port), &origin, BridgeOptions::default())
        .await
        .expect("Handshake over WebSocket should succeed");

    let (sender, mut draws) = unbounded_channel();
    client
        .add_magix_event_listener("draw", move |value| {
            let _ = sender.send(value.clone());
        })
        .expect("Listener registration should succeed");
    let draw = next_value(&mut draws).await;
    client.next_page();
    client.destroy().expect("first destroy succeeds");

    // THEN: Each side saw what the other sent
    assert_eq!(draw, json!({"x": 1}));
    assert_eq!(client.total_pages(), Some(4));

    let seen = host.await.expect("Host task panicked");
    let kinds: Vec<MessageKind> = seen.into_iter().map(|envelope| envelope.kind).collect();
    assert_eq!(
        kinds,
        vec![
            MessageKind::SdkCreate,
            MessageKind::RegisterMagixEvent,
            MessageKind::NextPage,
            MessageKind::RemoveAllMagixEvent,
        ]
    );
}

#[tokio::test]
async fn given_host_closes_before_init_when_creating_bridge_then_returns_channel_closed() {
    // GIVEN: A host that hangs up after the announcement
    let (listener, url) = bind_host().await;
    let host = tokio::spawn(async move {
        let mut ws = accept_host(&listener).await;
        let announcement = recv_envelope(&mut ws).await;
        ws.close(None).await.expect("Failed to close");
        announcement
    });

    // WHEN: Creating the bridge
    let port = WsPort::connect(&url).await.expect("Failed to connect");
    let origin = port.peer_origin().to_string();
    let result = create_bridge(Arc::new(port), &origin, BridgeOptions::default()).await;

    // THEN: ChannelClosed rather than a timeout
    assert!(
        matches!(result, Err(BridgeError::ChannelClosed { .. })),
        "Expected ChannelClosed, got {result:?}"
    );
    let announcement = host.await.expect("Host task panicked");
    assert_eq!(announcement.kind, MessageKind::SdkCreate);
}

#[tokio::test]
async fn given_nothing_listening_when_connecting_then_returns_connect_error() {
    let result = WsPort::connect("ws://127.0.0.1:1").await;

    assert!(matches!(result, Err(TransportError::Connect { .. })));
}

#[tokio::test]
async fn given_non_websocket_url_when_connecting_then_returns_invalid_url() {
    let http = WsPort::connect("http://127.0.0.1:19876").await;
    let garbage = WsPort::connect("not a url").await;

    assert!(matches!(http, Err(TransportError::InvalidUrl { .. })));
    assert!(matches!(garbage, Err(TransportError::InvalidUrl { .. })));
}
