//! One probe session against a host peer.
//!
//! Connects over WebSocket, completes the handshake, logs the initial state
//! and every notification, counts configured Magix events, and tears the
//! bridge down when the shutdown future resolves.

use crate::error::ProbeError;

use bridge_core::config::BridgeConfig;
use bridge_core::transport::ws::WsPort;
use bridge_core::{BridgeClient, StateEvent, create_bridge};

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{info, warn};

/// What a finished session observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSummary {
    pub magix_events_received: usize,
    /// Follower flag at shutdown.
    pub was_follower: bool,
}

/// Run until Ctrl-C.
///
/// # Errors
///
/// See [`run_until`].
pub async fn run(config: &BridgeConfig) -> Result<ProbeSummary, ProbeError> {
    run_until(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C, shutting down: {}", e);
        }
    })
    .await
}

/// Run until `shutdown` resolves, then destroy the bridge.
///
/// # Errors
///
/// - [`ProbeError::Config`] if the target origin cannot be resolved
/// - [`ProbeError::Bridge`] if connecting, the handshake, listener
///   registration, or teardown fails
pub async fn run_until<F>(config: &BridgeConfig, shutdown: F) -> Result<ProbeSummary, ProbeError>
where
    F: Future<Output = ()>,
{
    let target_origin = config.resolved_target_origin()?;

    info!("Connecting to host peer at {}", config.host.url);
    let port = WsPort::connect(&config.host.url).await?;
    let client = create_bridge(Arc::new(port), &target_origin, config.options()).await?;

    log_snapshot(&client);

    client.on(StateEvent::AttributesUpdate, |patch| {
        info!("attributesUpdate: {}", patch);
    });
    client.on(StateEvent::RoomStateChanged, |patch| {
        info!("roomStateChanged: {}", patch);
    });

    let received = Arc::new(AtomicUsize::new(0));
    for event in &config.magix.events {
        let counter = Arc::clone(&received);
        let name = event.clone();
        client.add_magix_event_listener(event, move |payload| {
            counter.fetch_add(1, Ordering::Relaxed);
            info!("Magix event '{}': {}", name, payload);
        })?;
    }
    info!(
        "Listening for {} Magix event(s); waiting for shutdown",
        config.magix.events.len()
    );

    shutdown.await;

    let summary = ProbeSummary {
        magix_events_received: received.load(Ordering::Relaxed),
        was_follower: client.is_follower(),
    };
    client.destroy()?;

    info!(
        "Probe finished: {} Magix event(s) received",
        summary.magix_events_received
    );
    Ok(summary)
}

fn log_snapshot(client: &BridgeClient) {
    info!("Bridge client {} ready", client.id());
    info!("Attributes: {:?}", client.attributes());
    info!("Room state: {:?}", client.room_state());
    info!("Follower: {}", client.is_follower());
    match (client.current_page(), client.total_pages()) {
        (Some(page), Some(total)) => info!("Page {} of {}", page, total),
        (Some(page), None) => info!("Page {}", page),
        _ => info!("No page position reported"),
    }
}
