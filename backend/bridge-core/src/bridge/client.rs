//! Bridge client state machine.
//!
//! A [`BridgeClient`] is created by a successful handshake and owns:
//! - the mirrored attribute bag and room-state snapshot
//! - local state-change and Magix listeners
//! - the Magix registration counts that drive remote (un)registration
//! - the inbound subscription, drained by one task in arrival order
//!
//! Mirrors change only on host messages (or locally when optimistic writes
//! are enabled). Every outbound message goes through one send primitive that
//! applies the follower gate; sends are fire-and-forget.
//!
//! # Teardown
//!
//! [`BridgeClient::destroy`] releases the subscription, clears listeners and
//! registrations, and tells the host to drop every Magix registration. If the
//! last handle is dropped without `destroy`, the same teardown runs from `Drop`.
//!
//! A handler that captures a [`BridgeClient`] keeps the client alive through
//! its own listener list, so `Drop` never fires. Such handlers either require
//! an explicit `destroy()` or should capture a [`WeakBridgeClient`] instead.

use crate::bridge::emitter::{Emitter, Handler, ListenerId};
use crate::bridge::gate;
use crate::bridge::options::BridgeOptions;
use crate::bridge::registry::ListenerRegistry;
use crate::error::bridge::BridgeError;
use crate::locks;
use crate::transport::{InboundMessage, MessagePort, Subscription, SubscriptionId, origin_matches};

use common::ErrorLocation;
use models::room_state;
use models::{
    Attributes, Envelope, InitPayload, MagixEventPayload, MessageKind, Patch, RoomState,
    apply_patch,
};

use std::fmt::{Debug, Display, Formatter, Result as FormatResult};
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use log::{debug, info, warn};
use serde_json::{Map, Value};
use tokio::spawn as TokioSpawn;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Attribute key some hosts use to publish the page count.
const TOTAL_PAGE_KEY: &str = "totalPage";

/// Local state-change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateEvent {
    /// Attributes were patched; handlers receive the incoming patch.
    AttributesUpdate,
    /// Room state was patched; handlers receive the incoming patch.
    RoomStateChanged,
}

impl StateEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateEvent::AttributesUpdate => "attributesUpdate",
            StateEvent::RoomStateChanged => "roomStateChanged",
        }
    }
}

impl Display for StateEvent {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}

/// Handle to a live bridge. Clones share the same client.
///
/// Handlers holding a handle require an explicit [`destroy`](Self::destroy);
/// use [`downgrade`](Self::downgrade) to reach the client from a handler
/// without keeping it alive.
#[derive(Clone)]
pub struct BridgeClient {
    inner: Arc<BridgeInner>,
}

/// Non-owning handle for use inside listeners.
#[derive(Clone)]
pub struct WeakBridgeClient {
    inner: Weak<BridgeInner>,
}

impl WeakBridgeClient {
    /// `None` once every [`BridgeClient`] handle has been dropped.
    pub fn upgrade(&self) -> Option<BridgeClient> {
        self.inner.upgrade().map(|inner| BridgeClient { inner })
    }
}

impl Debug for WeakBridgeClient {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter
            .debug_struct("WeakBridgeClient")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

struct BridgeInner {
    id: Uuid,
    target_origin: String,
    options: BridgeOptions,
    port: Arc<dyn MessagePort>,
    subscription_id: SubscriptionId,
    attributes: RwLock<Attributes>,
    room_state: RwLock<RoomState>,
    state_listeners: Emitter<StateEvent>,
    magix_listeners: Emitter<String>,
    registrations: Mutex<ListenerRegistry>,
    destroyed: AtomicBool,
    inbound_task: Mutex<Option<JoinHandle<()>>>,
}

impl BridgeClient {
    /// Seed a client from `init` and start draining `subscription`.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn start(
        port: Arc<dyn MessagePort>,
        target_origin: String,
        init: InitPayload,
        options: BridgeOptions,
        subscription: Subscription,
    ) -> Self {
        let inner = Arc::new(BridgeInner {
            id: Uuid::new_v4(),
            target_origin,
            options,
            port,
            subscription_id: subscription.id(),
            attributes: RwLock::new(init.attributes),
            room_state: RwLock::new(init.room_state),
            state_listeners: Emitter::default(),
            magix_listeners: Emitter::default(),
            registrations: Mutex::new(ListenerRegistry::new()),
            destroyed: AtomicBool::new(false),
            inbound_task: Mutex::new(None),
        });

        let task = TokioSpawn(inbound_loop(Arc::downgrade(&inner), subscription));
        *locks::lock(&inner.inbound_task) = Some(task);

        info!(
            "Bridge client {} started for {}",
            inner.id, inner.target_origin
        );
        BridgeClient { inner }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn downgrade(&self) -> WeakBridgeClient {
        WeakBridgeClient {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn target_origin(&self) -> &str {
        &self.inner.target_origin
    }

    pub fn options(&self) -> &BridgeOptions {
        &self.inner.options
    }

    /// Snapshot of the mirrored attribute bag.
    pub fn attributes(&self) -> Attributes {
        locks::read(&self.inner.attributes).clone()
    }

    pub fn attribute(&self, key: &str) -> Option<Value> {
        locks::read(&self.inner.attributes).get(key).cloned()
    }

    /// Snapshot of the mirrored room state.
    pub fn room_state(&self) -> RoomState {
        locks::read(&self.inner.room_state).clone()
    }

    pub fn is_follower(&self) -> bool {
        self.inner.is_follower()
    }

    /// Zero-based scene index from the room state.
    pub fn current_index(&self) -> Option<u64> {
        room_state::scene_index(&locks::read(&self.inner.room_state))
    }

    /// One-based page number.
    pub fn current_page(&self) -> Option<u64> {
        self.current_index().map(|index| index + 1)
    }

    /// Scene count from the room state, else the `totalPage` attribute.
    pub fn total_pages(&self) -> Option<u64> {
        room_state::scene_count(&locks::read(&self.inner.room_state)).or_else(|| {
            locks::read(&self.inner.attributes)
                .get(TOTAL_PAGE_KEY)
                .and_then(Value::as_u64)
        })
    }

    /// Local listeners currently counted for a Magix event.
    pub fn magix_listener_count(&self, event: &str) -> usize {
        locks::lock(&self.inner.registrations).count(event)
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }

    // ------------------------------------------------------------------
    // Local subscriptions
    // ------------------------------------------------------------------

    /// Attach a state-change handler. Handlers run on the inbound task, after
    /// the mirror has been patched, with the incoming patch as argument.
    ///
    /// After [`destroy`](Self::destroy) the handler is not attached.
    pub fn on<F>(&self, event: StateEvent, handler: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        if self.inner.is_destroyed() {
            warn!("Not attaching {} listener: bridge is destroyed", event);
            return ListenerId::new();
        }
        self.inner.state_listeners.on(event, Arc::new(handler))
    }

    /// Detach a state-change handler. Returns `false` if it was not attached.
    pub fn off(&self, event: StateEvent, id: ListenerId) -> bool {
        self.inner.state_listeners.off(&event, id)
    }

    /// Listen for a Magix event. The first listener for a name registers it
    /// with the host. Handlers receive the event's payload.
    ///
    /// Allowed in follower mode.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Destroyed`] after teardown.
    pub fn add_magix_event_listener<F>(
        &self,
        event: &str,
        handler: F,
    ) -> Result<ListenerId, BridgeError>
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(handler);
        let mut registrations = locks::lock(&self.inner.registrations);
        if self.inner.is_destroyed() {
            return Err(BridgeError::Destroyed {
                message: format!("Cannot listen for '{event}': bridge is destroyed"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let id = self.inner.magix_listeners.on(event.to_string(), handler);
        if registrations.acquire(event) {
            self.inner
                .send(MessageKind::RegisterMagixEvent, Value::from(event));
        }
        Ok(id)
    }

    /// Stop a Magix listener. The last listener for a name unregisters it
    /// with the host.
    ///
    /// Allowed in follower mode.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::UnregisteredListener`] if nothing is registered for
    ///   `event`, or `id` is not one of its listeners
    /// - [`BridgeError::Destroyed`] after teardown
    pub fn remove_magix_event_listener(
        &self,
        event: &str,
        id: ListenerId,
    ) -> Result<(), BridgeError> {
        let mut registrations = locks::lock(&self.inner.registrations);
        if self.inner.is_destroyed() {
            return Err(BridgeError::Destroyed {
                message: format!("Cannot remove listener for '{event}': bridge is destroyed"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if !registrations.contains(event) {
            return Err(BridgeError::UnregisteredListener {
                message: format!("No Magix listener registered for '{event}'"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if !self.inner.magix_listeners.off(event, id) {
            return Err(BridgeError::UnregisteredListener {
                message: format!("Listener {id} is not attached to '{event}'"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        if registrations.release(event)? {
            self.inner
                .send(MessageKind::RemoveMagixEvent, Value::from(event));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Outbound requests
    // ------------------------------------------------------------------

    /// Ask the host to patch the attribute bag. `null` values delete keys.
    ///
    /// The mirror is not touched until the host echoes the change, unless
    /// optimistic local writes are enabled. Suppressed in follower mode.
    pub fn set_attributes(&self, patch: Patch) {
        if !self.inner.ensure_live(MessageKind::SetAttributes) {
            return;
        }
        if !gate::admits(&MessageKind::SetAttributes, self.inner.is_follower()) {
            debug!("Follower mode: suppressed {}", MessageKind::SetAttributes);
            return;
        }

        if self.inner.options.optimistic_local_writes {
            patch.apply_to(&mut locks::write(&self.inner.attributes));
        }
        self.inner
            .send(MessageKind::SetAttributes, patch.into_value());
    }

    /// Broadcast a Magix event through the host. Suppressed in follower mode.
    pub fn dispatch_magix_event(&self, event: &str, payload: Value) {
        if !self.inner.ensure_live(MessageKind::DispatchMagixEvent) {
            return;
        }
        let body = MagixEventPayload::new(event, payload).into_value();
        self.inner.send(MessageKind::DispatchMagixEvent, body);
    }

    /// Ask the host for the next page. Bounds are left to the host.
    pub fn next_page(&self) {
        if self.inner.ensure_live(MessageKind::NextPage) {
            self.inner.send(MessageKind::NextPage, Value::Bool(true));
        }
    }

    /// Ask the host for the previous page. Bounds are left to the host.
    pub fn prev_page(&self) {
        if self.inner.ensure_live(MessageKind::PrevPage) {
            self.inner.send(MessageKind::PrevPage, Value::Bool(true));
        }
    }

    /// Tear the bridge down. Safe to call from inside a listener.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::DoubleDestroy`] if the bridge was already destroyed.
    pub fn destroy(&self) -> Result<(), BridgeError> {
        if self.inner.destroyed.swap(true, Ordering::AcqRel) {
            return Err(BridgeError::DoubleDestroy {
                message: format!("Bridge client {} is already destroyed", self.inner.id),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.inner.teardown();
        info!("Bridge client {} destroyed", self.inner.id);
        Ok(())
    }
}

impl Debug for BridgeClient {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter
            .debug_struct("BridgeClient")
            .field("id", &self.inner.id)
            .field("target_origin", &self.inner.target_origin)
            .field("destroyed", &self.inner.is_destroyed())
            .finish()
    }
}

impl BridgeInner {
    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    fn is_follower(&self) -> bool {
        room_state::is_follower(&locks::read(&self.room_state))
    }

    fn ensure_live(&self, kind: MessageKind) -> bool {
        if self.is_destroyed() {
            warn!("Dropping {}: bridge client {} is destroyed", kind, self.id);
            return false;
        }
        true
    }

    /// Gated, fire-and-forget send. Returns whether the message was posted.
    fn send(&self, kind: MessageKind, payload: Value) -> bool {
        if !gate::admits(&kind, self.is_follower()) {
            debug!("Follower mode: suppressed {}", kind);
            return false;
        }

        let envelope = Envelope::new(kind.clone(), payload).into_value();
        match self.port.post_message(envelope, &self.target_origin) {
            Ok(()) => {
                debug!("Sent {} to {}", kind, self.target_origin);
                true
            }
            Err(e) => {
                warn!("Failed to send {}: {}", kind, e);
                false
            }
        }
    }

    fn handle_inbound(&self, message: InboundMessage) {
        if !origin_matches(&self.target_origin, &message.origin) {
            debug!("Ignoring message from {}", message.origin);
            return;
        }

        let envelope = match Envelope::from_value(message.data) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Dropping inbound message: {}", BridgeError::from(e));
                return;
            }
        };

        match envelope.kind {
            MessageKind::AttributesUpdate | MessageKind::SetAttributes => {
                if merge_update(&self.attributes, &envelope.payload, &envelope.kind) {
                    self.state_listeners
                        .emit(&StateEvent::AttributesUpdate, &envelope.payload);
                }
            }
            MessageKind::RoomStateChanged => {
                if merge_update(&self.room_state, &envelope.payload, &envelope.kind) {
                    self.state_listeners
                        .emit(&StateEvent::RoomStateChanged, &envelope.payload);
                }
            }
            MessageKind::ReciveMagixEvent => match MagixEventPayload::from_value(envelope.payload) {
                Ok(event) => {
                    let delivered = self
                        .magix_listeners
                        .emit(event.event.as_str(), &event.payload);
                    if delivered == 0 {
                        debug!("No listener for Magix event '{}'", event.event);
                    }
                }
                Err(e) => warn!("Dropping Magix event: {}", BridgeError::from(e)),
            },
            other => debug!("Ignoring inbound {}", other),
        }
    }

    fn teardown(&self) {
        self.port.unsubscribe(self.subscription_id);
        if let Some(task) = locks::lock(&self.inbound_task).take() {
            task.abort();
        }

        self.state_listeners.clear();
        self.magix_listeners.clear();
        locks::lock(&self.registrations).clear();

        self.send(MessageKind::RemoveAllMagixEvent, Value::Bool(true));
    }
}

impl Drop for BridgeInner {
    fn drop(&mut self) {
        if self.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }
        warn!(
            "Bridge client {} dropped without destroy(), tearing down",
            self.id
        );
        self.teardown();
    }
}

/// Patch a mirror from an update payload. Non-object payloads are dropped.
fn merge_update(target: &RwLock<Map<String, Value>>, payload: &Value, kind: &MessageKind) -> bool {
    let Some(patch) = payload.as_object() else {
        warn!("Dropping {}: payload is not an object", kind);
        return false;
    };

    apply_patch(&mut locks::write(target), patch);
    true
}

async fn inbound_loop(client: Weak<BridgeInner>, mut subscription: Subscription) {
    while let Some(message) = subscription.recv().await {
        let Some(inner) = client.upgrade() else {
            break;
        };
        if inner.is_destroyed() {
            break;
        }
        inner.handle_inbound(message);
    }
    debug!("Inbound loop for subscription {} ended", subscription.id());
}
