//! WebSocket message port for out-of-process hosts.
//!
//! Each envelope travels as one JSON text frame. Inbound frames are tagged
//! with the origin of the host URL; frames that are not JSON are logged and
//! skipped. When the socket closes every subscription ends.

use crate::error::transport::TransportError;
use crate::transport::{
    InboundMessage, MessagePort, Subscribers, Subscription, SubscriptionId, origin_matches,
};

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::spawn as TokioSpawn;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

#[derive(Debug)]
pub struct WsPort {
    peer_origin: String,
    outbound: UnboundedSender<String>,
    inbox: Arc<Subscribers>,
}

impl WsPort {
    /// Connect to a host peer at a `ws://` or `wss://` URL.
    ///
    /// # Errors
    ///
    /// - [`TransportError::InvalidUrl`] if the URL does not parse or is not a WebSocket URL
    /// - [`TransportError::Connect`] if the WebSocket handshake fails
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let parsed = Url::parse(url)?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(TransportError::InvalidUrl {
                message: format!("Expected ws:// or wss:// URL, got {url}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        let peer_origin = parsed.origin().ascii_serialization();

        let (stream, _) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect {
                message: format!("Failed to connect to {url}: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })?;
        info!("Connected to host peer at {}", url);

        let (mut sink, mut source) = stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let inbox = Arc::new(Subscribers::default());

        TokioSpawn(async move {
            while let Some(text) = outbound_rx.recv().await {
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    error!("Failed to send frame to host peer: {}", e);
                    break;
                }
            }
            // Every WsPort handle is gone or the socket failed.
            let _ = sink.close().await;
        });

        let reader_inbox = Arc::clone(&inbox);
        let reader_origin = peer_origin.clone();
        TokioSpawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<Value>(text.as_str()) {
                        Ok(data) => {
                            reader_inbox.deliver(InboundMessage {
                                origin: reader_origin.clone(),
                                data,
                            });
                        }
                        Err(e) => warn!("Skipping non-JSON frame from {}: {}", reader_origin, e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        error!("Connection to {} failed: {}", reader_origin, e);
                        break;
                    }
                }
            }

            reader_inbox.close();
            info!("Connection to {} closed", reader_origin);
        });

        Ok(Self {
            peer_origin,
            outbound,
            inbox,
        })
    }

    /// Origin of the host URL, e.g. `ws://127.0.0.1:19876`.
    pub fn peer_origin(&self) -> &str {
        &self.peer_origin
    }
}

impl MessagePort for WsPort {
    fn post_message(&self, data: Value, target_origin: &str) -> Result<(), TransportError> {
        if !origin_matches(target_origin, &self.peer_origin) {
            debug!(
                "Dropping message for {} (peer origin is {})",
                target_origin, self.peer_origin
            );
            return Ok(());
        }

        let text = serde_json::to_string(&data).map_err(|e| TransportError::Send {
            message: format!("Failed to encode message: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        self.outbound
            .send(text)
            .map_err(|_| TransportError::Closed {
                message: format!("Connection to {} is closed", self.peer_origin),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn subscribe(&self) -> Subscription {
        self.inbox.subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inbox.unsubscribe(id);
    }
}
