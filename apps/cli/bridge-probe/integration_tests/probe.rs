use bridge_probe::error::ProbeError;
use bridge_probe::probe::{ProbeSummary, run_until};

use bridge_core::config::BridgeConfig;
use models::{Envelope, MessageKind};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::Message};

async fn recv_envelope(ws: &mut WebSocketStream<TcpStream>) -> Envelope {
    loop {
        let frame = ws
            .next()
            .await
            .expect("Probe closed the socket")
            .expect("Error receiving frame");
        if let Message::Text(text) = frame {
            let value: Value = serde_json::from_str(text.as_str()).expect("Frame is not JSON");
            return Envelope::from_value(value).expect("Frame is not an envelope");
        }
    }
}

/// **VALUE**: Verifies a full probe session against a real host socket:
/// announcement, registration of every configured Magix event, teardown.
///
/// **WHY THIS MATTERS**: The probe is the manual smoke test for host
/// integrations. If it skips registrations or leaves them behind, it reports
/// a healthy host that is actually misconfigured.
#[tokio::test]
async fn given_ws_host_when_probe_runs_then_registers_events_and_cleans_up() {
    // GIVEN: A scripted host that puts the probe in follower mode
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test host");
    let url = format!("ws://{}", listener.local_addr().expect("bound address"));
    let host = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("Failed to accept");
        let mut ws = accept_async(stream).await.expect("WebSocket upgrade failed");

        let mut kinds = vec![recv_envelope(&mut ws).await];
        let init = Envelope::new(
            MessageKind::Init,
            json!({"attributes": {}, "roomState": {"broadcastState": {"mode": "follower"}}}),
        );
        ws.send(Message::Text(init.into_value().to_string().into()))
            .await
            .expect("Failed to send Init");

        for _ in 0..3 {
            kinds.push(recv_envelope(&mut ws).await);
        }
        kinds
    });

    let mut config = BridgeConfig::default();
    config.host.url = url;
    config.magix.events = vec!["nextPage".to_string(), "prevPage".to_string()];

    // WHEN: Running the probe with an immediate shutdown
    let summary = run_until(&config, async {})
        .await
        .expect("Probe session should succeed");

    // THEN: Summary reflects the session
    assert_eq!(
        summary,
        ProbeSummary {
            magix_events_received: 0,
            was_follower: true,
        }
    );

    // THEN: Host saw announcement, both registrations, and teardown
    let seen = host.await.expect("Host task panicked");
    assert_eq!(
        seen,
        vec![
            Envelope::new(MessageKind::SdkCreate, true),
            Envelope::new(MessageKind::RegisterMagixEvent, "nextPage"),
            Envelope::new(MessageKind::RegisterMagixEvent, "prevPage"),
            Envelope::new(MessageKind::RemoveAllMagixEvent, true),
        ]
    );
}

#[tokio::test]
async fn given_unreachable_host_when_probe_runs_then_returns_bridge_error() {
    let mut config = BridgeConfig::default();
    config.host.url = "ws://127.0.0.1:1".to_string();

    let result = run_until(&config, async {}).await;

    assert!(
        matches!(result, Err(ProbeError::Bridge { .. })),
        "Expected ProbeError::Bridge, got {result:?}"
    );
}

#[tokio::test]
async fn given_invalid_target_origin_when_probe_runs_then_returns_config_error() {
    let mut config = BridgeConfig::default();
    config.host.target_origin = Some("not an origin".to_string());

    let result = run_until(&config, async {}).await;

    assert!(matches!(result, Err(ProbeError::Config { .. })));
}
