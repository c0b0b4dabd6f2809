//! Reference counts for remotely registered Magix event names.
//!
//! The host only needs to know which names have at least one local
//! listener. `acquire` reports the first registration of a name and
//! `release` reports the last, which is when the bridge tells the host.

use crate::error::bridge::BridgeError;

use common::ErrorLocation;

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::panic::Location;

#[derive(Debug, Default)]
pub struct ListenerRegistry {
    counts: HashMap<String, NonZeroUsize>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more listener for `event`. Returns `true` on the first one.
    pub fn acquire(&mut self, event: &str) -> bool {
        match self.counts.get_mut(event) {
            Some(count) => {
                *count = count.saturating_add(1);
                false
            }
            None => {
                self.counts.insert(event.to_string(), NonZeroUsize::MIN);
                true
            }
        }
    }

    /// Count one listener fewer for `event`. Returns `true` when that was the last one.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnregisteredListener`] if no listener is counted for `event`.
    #[track_caller]
    pub fn release(&mut self, event: &str) -> Result<bool, BridgeError> {
        let Some(count) = self.counts.get(event).copied() else {
            return Err(BridgeError::UnregisteredListener {
                message: format!("No Magix listener registered for '{event}'"),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        match NonZeroUsize::new(count.get() - 1) {
            Some(remaining) => {
                self.counts.insert(event.to_string(), remaining);
                Ok(false)
            }
            None => {
                self.counts.remove(event);
                Ok(true)
            }
        }
    }

    pub fn count(&self, event: &str) -> usize {
        self.counts.get(event).map_or(0, |count| count.get())
    }

    pub fn contains(&self, event: &str) -> bool {
        self.counts.contains_key(event)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }
}
