//! In-process window pair.
//!
//! Each [`LocalWindow`] knows its own origin and its peer's inbox. Posting to
//! one window delivers to the other's subscribers tagged with the sender's
//! origin, the way `window.postMessage` behaves between a page and its iframe.

use crate::error::transport::TransportError;
use crate::transport::{
    InboundMessage, MessagePort, Subscribers, Subscription, SubscriptionId, origin_matches,
};

use std::sync::Arc;

use log::debug;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct LocalWindow {
    origin: String,
    inbox: Arc<Subscribers>,
    peer_origin: String,
    peer_inbox: Arc<Subscribers>,
}

impl LocalWindow {
    /// Create two connected windows with the given origins.
    pub fn pair(first_origin: &str, second_origin: &str) -> (LocalWindow, LocalWindow) {
        let first_inbox = Arc::new(Subscribers::default());
        let second_inbox = Arc::new(Subscribers::default());

        let first = LocalWindow {
            origin: first_origin.to_string(),
            inbox: Arc::clone(&first_inbox),
            peer_origin: second_origin.to_string(),
            peer_inbox: Arc::clone(&second_inbox),
        };
        let second = LocalWindow {
            origin: second_origin.to_string(),
            inbox: second_inbox,
            peer_origin: first_origin.to_string(),
            peer_inbox: first_inbox,
        };

        (first, second)
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Subscriptions currently attached to this window.
    pub fn listener_count(&self) -> usize {
        self.inbox.len()
    }

    /// Subscriptions currently attached to the peer window.
    pub fn peer_listener_count(&self) -> usize {
        self.peer_inbox.len()
    }
}

impl MessagePort for LocalWindow {
    fn post_message(&self, data: Value, target_origin: &str) -> Result<(), TransportError> {
        if !origin_matches(target_origin, &self.peer_origin) {
            debug!(
                "Dropping message for {} (peer origin is {})",
                target_origin, self.peer_origin
            );
            return Ok(());
        }

        self.peer_inbox.deliver(InboundMessage {
            origin: self.origin.clone(),
            data,
        });
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        self.inbox.subscribe()
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inbox.unsubscribe(id);
    }
}
