//! Patch rule shared by the attribute bag and the room-state mirror.
//!
//! A patch is a shallow JSON object. For each key: [`ABSENT`] (`null`) removes
//! the key from the target, any other value overwrites it. Keys the patch
//! does not mention are left alone.

use crate::envelope::json_type;
use crate::error::model_error::ModelError;

use common::ErrorLocation;

use std::panic::Location;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Host-owned key/value bag mirrored by the bridge.
pub type Attributes = Map<String, Value>;

/// Marker that deletes a key when it appears as a patch value.
pub const ABSENT: Value = Value::Null;

/// Apply `patch` to `target` in place.
pub fn apply_patch(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        if value.is_null() {
            target.remove(key);
        } else {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Attribute change request sent to the host.
///
/// ```
/// use models::Patch;
///
/// let patch = Patch::new().set("color", "red").remove("stale");
/// assert_eq!(patch.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    entries: Map<String, Value>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`. A `null` value is a removal.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Mark `key` for removal.
    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.entries.insert(key.into(), ABSENT);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &Map<String, Value> {
        &self.entries
    }

    pub fn apply_to(&self, target: &mut Map<String, Value>) {
        apply_patch(target, &self.entries);
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.entries)
    }
}

impl From<Map<String, Value>> for Patch {
    fn from(entries: Map<String, Value>) -> Self {
        Self { entries }
    }
}

impl TryFrom<Value> for Patch {
    type Error = ModelError;

    #[track_caller]
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(entries) => Ok(Self { entries }),
            other => Err(ModelError::Validation {
                message: format!("Patch must be an object, got {}", json_type(&other)),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }
}
