use crate::error::transport::TransportError;

use common::ErrorLocation;
use models::ModelError;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum BridgeError {
    #[error("Handshake Timeout Error: {message} {location}")]
    HandshakeTimeout {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unregistered Listener Error: {message} {location}")]
    UnregisteredListener {
        message: String,
        location: ErrorLocation,
    },

    #[error("Double Destroy Error: {message} {location}")]
    DoubleDestroy {
        message: String,
        location: ErrorLocation,
    },

    #[error("Malformed Message Error: {message} {location}")]
    MalformedMessage {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid Origin Error: {message} {location}")]
    InvalidOrigin {
        message: String,
        location: ErrorLocation,
    },

    #[error("Destroyed Error: {message} {location}")]
    Destroyed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Channel Closed Error: {message} {location}")]
    ChannelClosed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Transport Error: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
        #[source]
        source: TransportError,
    },
}

impl From<ModelError> for BridgeError {
    #[track_caller]
    fn from(error: ModelError) -> Self {
        BridgeError::MalformedMessage {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<TransportError> for BridgeError {
    #[track_caller]
    fn from(error: TransportError) -> Self {
        BridgeError::Transport {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: error,
        }
    }
}

impl From<url::ParseError> for BridgeError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        BridgeError::InvalidOrigin {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
