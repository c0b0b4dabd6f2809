//! Tagged envelope exchanged with the host peer.
//!
//! Every message on the channel is `{ "kind": <tag>, "payload": <any> }`.
//! Tags are kept as a closed enum for the ones the bridge understands, with
//! [`MessageKind::Other`] carrying anything else so unknown traffic can be
//! logged and ignored instead of failing the decode.

use crate::error::model_error::ModelError;

use common::ErrorLocation;

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const KIND_KEY: &str = "kind";
const PAYLOAD_KEY: &str = "payload";

const SDK_CREATE: &str = "SDKCreate";
const INIT: &str = "Init";
const ATTRIBUTES_UPDATE: &str = "AttributesUpdate";
const SET_ATTRIBUTES: &str = "SetAttributes";
const DISPATCH_MAGIX_EVENT: &str = "DispatchMagixEvent";
// Spelling matches the tag hosts already send.
const RECIVE_MAGIX_EVENT: &str = "ReciveMagixEvent";
const REGISTER_MAGIX_EVENT: &str = "RegisterMagixEvent";
const REMOVE_MAGIX_EVENT: &str = "RemoveMagixEvent";
const REMOVE_ALL_MAGIX_EVENT: &str = "RemoveAllMagixEvent";
const ROOM_STATE_CHANGED: &str = "RoomStateChanged";
const NEXT_PAGE: &str = "NextPage";
const PREV_PAGE: &str = "PrevPage";

/// Message tag carried in the `kind` field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    /// Embedded → host readiness announcement.
    SdkCreate,
    /// Host → embedded initial state.
    Init,
    AttributesUpdate,
    SetAttributes,
    DispatchMagixEvent,
    ReciveMagixEvent,
    RegisterMagixEvent,
    RemoveMagixEvent,
    RemoveAllMagixEvent,
    RoomStateChanged,
    NextPage,
    PrevPage,
    /// Any tag this bridge does not understand.
    Other(String),
}

impl MessageKind {
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::SdkCreate => SDK_CREATE,
            MessageKind::Init => INIT,
            MessageKind::AttributesUpdate => ATTRIBUTES_UPDATE,
            MessageKind::SetAttributes => SET_ATTRIBUTES,
            MessageKind::DispatchMagixEvent => DISPATCH_MAGIX_EVENT,
            MessageKind::ReciveMagixEvent => RECIVE_MAGIX_EVENT,
            MessageKind::RegisterMagixEvent => REGISTER_MAGIX_EVENT,
            MessageKind::RemoveMagixEvent => REMOVE_MAGIX_EVENT,
            MessageKind::RemoveAllMagixEvent => REMOVE_ALL_MAGIX_EVENT,
            MessageKind::RoomStateChanged => ROOM_STATE_CHANGED,
            MessageKind::NextPage => NEXT_PAGE,
            MessageKind::PrevPage => PREV_PAGE,
            MessageKind::Other(tag) => tag,
        }
    }
}

impl From<&str> for MessageKind {
    fn from(tag: &str) -> Self {
        match tag {
            SDK_CREATE => MessageKind::SdkCreate,
            INIT => MessageKind::Init,
            ATTRIBUTES_UPDATE => MessageKind::AttributesUpdate,
            SET_ATTRIBUTES => MessageKind::SetAttributes,
            DISPATCH_MAGIX_EVENT => MessageKind::DispatchMagixEvent,
            RECIVE_MAGIX_EVENT => MessageKind::ReciveMagixEvent,
            REGISTER_MAGIX_EVENT => MessageKind::RegisterMagixEvent,
            REMOVE_MAGIX_EVENT => MessageKind::RemoveMagixEvent,
            REMOVE_ALL_MAGIX_EVENT => MessageKind::RemoveAllMagixEvent,
            ROOM_STATE_CHANGED => MessageKind::RoomStateChanged,
            NEXT_PAGE => MessageKind::NextPage,
            PREV_PAGE => MessageKind::PrevPage,
            other => MessageKind::Other(other.to_string()),
        }
    }
}

impl From<String> for MessageKind {
    fn from(tag: String) -> Self {
        match MessageKind::from(tag.as_str()) {
            MessageKind::Other(_) => MessageKind::Other(tag),
            known => known,
        }
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for MessageKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(self.as_str())
    }
}

/// One message on the bridge channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: MessageKind,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    pub fn new(kind: MessageKind, payload: impl Into<Value>) -> Self {
        Self {
            kind,
            payload: payload.into(),
        }
    }

    /// Decode an envelope from a raw channel value.
    ///
    /// # Errors
    ///
    /// - [`ModelError::Validation`] if the value is not a JSON object
    /// - [`ModelError::Decode`] if `kind` is missing or not a string
    #[track_caller]
    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        if !value.is_object() {
            return Err(ModelError::Validation {
                message: format!("Envelope must be an object, got {}", json_type(&value)),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        serde_json::from_value(value).map_err(|e| ModelError::Decode {
            message: format!("Invalid envelope: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Encode into the `{ kind, payload }` object posted on the channel.
    pub fn into_value(self) -> Value {
        let mut object = Map::with_capacity(2);
        object.insert(KIND_KEY.to_string(), Value::String(self.kind.into()));
        object.insert(PAYLOAD_KEY.to_string(), self.payload);
        Value::Object(object)
    }
}

/// Short JSON type name for error messages.
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
