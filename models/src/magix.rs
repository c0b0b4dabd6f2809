use crate::envelope::json_type;
use crate::error::model_error::ModelError;

use common::ErrorLocation;

use std::panic::Location;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{ event, payload }` body of `DispatchMagixEvent` and `ReciveMagixEvent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagixEventPayload {
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

impl MagixEventPayload {
    pub fn new(event: impl Into<String>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }

    #[track_caller]
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        if !value.is_object() {
            return Err(ModelError::Validation {
                message: format!("Magix event must be an object, got {}", json_type(&value)),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        serde_json::from_value(value).map_err(|e| ModelError::Decode {
            message: format!("Invalid Magix event: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    pub fn into_value(self) -> Value {
        serde_json::json!({
            "event": self.event,
            "payload": self.payload,
        })
    }
}
