//! Message-port abstraction the bridge runs on.
//!
//! A [`MessagePort`] is the cross-origin primitive underneath the protocol:
//! it posts a JSON value to the peer when the target origin matches, and fans
//! inbound values (tagged with the sender's origin) out to subscriptions.
//!
//! - [`local::LocalWindow`] pairs two in-process windows
//! - [`ws::WsPort`] talks to an out-of-process host over a WebSocket

pub mod local;
pub mod ws;

use crate::ANY_ORIGIN;
use crate::error::transport::TransportError;
use crate::locks;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// A value received from the peer, with the origin it was sent from.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub origin: String,
    pub data: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for SubscriptionId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.0)
    }
}

/// Receiving end of a port subscription.
///
/// Messages arrive in the order the port received them. `recv` returns `None`
/// once the subscription is released or the port closes.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: UnboundedReceiver<InboundMessage>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub async fn recv(&mut self) -> Option<InboundMessage> {
        self.receiver.recv().await
    }

    /// Next message if one is already queued.
    pub fn try_recv(&mut self) -> Option<InboundMessage> {
        self.receiver.try_recv().ok()
    }
}

/// Low-level cross-origin messaging primitive.
pub trait MessagePort: Send + Sync + 'static {
    /// Post `data` to the peer. Delivery happens only when `target_origin` is
    /// `"*"` or equals the peer's origin; otherwise the value is dropped and
    /// `Ok(())` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the underlying channel cannot take the message.
    fn post_message(&self, data: Value, target_origin: &str) -> Result<(), TransportError>;

    fn subscribe(&self) -> Subscription;

    /// Release a subscription. Its receiver sees `None` after queued messages drain.
    fn unsubscribe(&self, id: SubscriptionId);
}

pub fn origin_matches(expected: &str, actual: &str) -> bool {
    expected == ANY_ORIGIN || expected == actual
}

/// Subscriber fan-out shared by the port implementations.
#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    entries: Mutex<Vec<(SubscriptionId, UnboundedSender<InboundMessage>)>>,
    closed: AtomicBool,
}

impl Subscribers {
    pub(crate) fn subscribe(&self) -> Subscription {
        let id = SubscriptionId::new();
        let (sender, receiver) = mpsc::unbounded_channel();

        let mut entries = locks::lock(&self.entries);
        // A closed port hands out subscriptions that end immediately.
        if !self.closed.load(Ordering::Acquire) {
            entries.push((id, sender));
        }

        Subscription { id, receiver }
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) {
        locks::lock(&self.entries).retain(|(entry_id, _)| *entry_id != id);
    }

    /// Deliver to every live subscriber; returns how many received it.
    pub(crate) fn deliver(&self, message: InboundMessage) -> usize {
        let mut entries = locks::lock(&self.entries);
        entries.retain(|(_, sender)| sender.send(message.clone()).is_ok());
        entries.len()
    }

    pub(crate) fn close(&self) {
        let mut entries = locks::lock(&self.entries);
        self.closed.store(true, Ordering::Release);
        entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        locks::lock(&self.entries).len()
    }
}
