use crate::envelope::json_type;
use crate::error::model_error::ModelError;
use crate::patch::Attributes;
use crate::room_state::RoomState;

use common::ErrorLocation;

use std::panic::Location;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload of the host's `Init` message: the state the bridge starts from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitPayload {
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub room_state: RoomState,
}

impl InitPayload {
    /// Decode an `Init` payload. Missing sections start empty.
    ///
    /// # Errors
    ///
    /// - [`ModelError::Validation`] if the payload is not an object
    /// - [`ModelError::Decode`] if `attributes` or `roomState` is not an object
    #[track_caller]
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        if !value.is_object() {
            return Err(ModelError::Validation {
                message: format!("Init payload must be an object, got {}", json_type(&value)),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        serde_json::from_value(value).map_err(|e| ModelError::Decode {
            message: format!("Invalid Init payload: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    pub fn into_value(self) -> Value {
        serde_json::json!({
            "attributes": self.attributes,
            "roomState": self.room_state,
        })
    }
}
