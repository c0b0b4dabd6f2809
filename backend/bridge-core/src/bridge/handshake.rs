//! Readiness handshake with the host peer.
//!
//! The embedded side subscribes, posts exactly one `SDKCreate` announcement,
//! and waits a bounded time for `Init`. Anything else that arrives first is
//! skipped. The subscription that saw `Init` is handed to the client, so no
//! message sent right after `Init` can be lost between two listeners.

use crate::bridge::client::BridgeClient;
use crate::bridge::options::BridgeOptions;
use crate::bridge::origin::normalize_origin;
use crate::error::bridge::BridgeError;
use crate::transport::{MessagePort, Subscription, origin_matches};

use common::ErrorLocation;
use models::{Envelope, InitPayload, MessageKind};

use std::panic::Location;
use std::sync::Arc;

use log::{debug, info, warn};

/// Announce readiness on `port` and build a [`BridgeClient`] from the host's `Init`.
///
/// # Errors
///
/// - [`BridgeError::InvalidOrigin`] if `target_origin` cannot be normalized
/// - [`BridgeError::Transport`] if the announcement cannot be posted
/// - [`BridgeError::HandshakeTimeout`] if no valid `Init` arrives within
///   `options.handshake_timeout`
/// - [`BridgeError::ChannelClosed`] if the port closes before `Init`
pub async fn create_bridge(
    port: Arc<dyn MessagePort>,
    target_origin: &str,
    options: BridgeOptions,
) -> Result<BridgeClient, BridgeError> {
    let target_origin = normalize_origin(target_origin)?;
    let mut subscription = port.subscribe();

    let announcement = Envelope::new(MessageKind::SdkCreate, true).into_value();
    if let Err(e) = port.post_message(announcement, &target_origin) {
        port.unsubscribe(subscription.id());
        return Err(BridgeError::from(e));
    }
    info!("Announced readiness to {}", target_origin);

    let waited = tokio::time::timeout(
        options.handshake_timeout,
        await_init(&mut subscription, &target_origin),
    )
    .await;

    match waited {
        Ok(Ok(init)) => {
            info!("Handshake with {} complete", target_origin);
            Ok(BridgeClient::start(
                port,
                target_origin,
                init,
                options,
                subscription,
            ))
        }
        Ok(Err(e)) => {
            port.unsubscribe(subscription.id());
            Err(e)
        }
        Err(_) => {
            port.unsubscribe(subscription.id());
            Err(BridgeError::HandshakeTimeout {
                message: format!(
                    "No Init from {} within {}ms",
                    target_origin,
                    options.handshake_timeout.as_millis()
                ),
                location: ErrorLocation::from(Location::caller()),
            })
        }
    }
}

async fn await_init(
    subscription: &mut Subscription,
    target_origin: &str,
) -> Result<InitPayload, BridgeError> {
    while let Some(message) = subscription.recv().await {
        if !origin_matches(target_origin, &message.origin) {
            debug!("Ignoring message from {} during handshake", message.origin);
            continue;
        }

        let envelope = match Envelope::from_value(message.data) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Ignoring malformed message during handshake: {}", e);
                continue;
            }
        };

        if envelope.kind != MessageKind::Init {
            debug!("Ignoring {} before Init", envelope.kind);
            continue;
        }

        match InitPayload::from_value(envelope.payload) {
            Ok(init) => return Ok(init),
            Err(e) => warn!("Ignoring Init with malformed payload: {}", e),
        }
    }

    Err(BridgeError::ChannelClosed {
        message: format!("Channel to {target_origin} closed before Init"),
        location: ErrorLocation::from(Location::caller()),
    })
}
