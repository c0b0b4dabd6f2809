//! Keyed listener lists.
//!
//! Handlers are stored behind `Arc` so `emit` can snapshot the list and call
//! out with no lock held. A handler may add or remove listeners, or tear the
//! whole client down, while it is being notified. A panicking handler is
//! logged and skipped; the remaining handlers still run.

use crate::locks;

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::hash::Hash;
use std::any::Any;
use std::mem;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use log::error;
use serde_json::Value;
use uuid::Uuid;

pub type Handler = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handle returned when attaching a listener, used to detach it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for ListenerId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.0)
    }
}

pub struct Emitter<K> {
    listeners: Mutex<HashMap<K, Vec<(ListenerId, Handler)>>>,
}

impl<K> Default for Emitter<K> {
    fn default() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash> Emitter<K> {
    pub fn on(&self, key: K, handler: Handler) -> ListenerId {
        let id = ListenerId::new();
        locks::lock(&self.listeners)
            .entry(key)
            .or_default()
            .push((id, handler));
        id
    }

    /// Detach `id` from `key`. Returns `false` if it was not attached there.
    pub fn off<Q>(&self, key: &Q, id: ListenerId) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let mut listeners = locks::lock(&self.listeners);
        let Some(handlers) = listeners.get_mut(key) else {
            return false;
        };

        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        let removed = handlers.len() != before;

        if handlers.is_empty() {
            listeners.remove(key);
        }
        removed
    }

    /// Call every handler attached to `key`, in attach order. Returns how many ran.
    pub fn emit<Q>(&self, key: &Q, value: &Value) -> usize
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let snapshot: Vec<Handler> = locks::lock(&self.listeners)
            .get(key)
            .map(|handlers| handlers.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        for handler in &snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| handler(value))) {
                error!("Listener panicked: {}", panic_message(panic.as_ref()));
            }
        }
        snapshot.len()
    }

    pub fn listener_count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        locks::lock(&self.listeners).get(key).map_or(0, Vec::len)
    }

    pub fn clear(&self) {
        let drained = mem::take(&mut *locks::lock(&self.listeners));
        // Handlers may own client handles; drop them outside the lock.
        drop(drained);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
