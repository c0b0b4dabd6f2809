use bridge_core::{BridgeError, ConfigError, TransportError};

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error;

/// Errors that end a probe run.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Error from the probe itself (paths, logging)
    #[error("Probe Error: {message} {location}")]
    Probe {
        message: String,
        location: ErrorLocation,
    },

    /// `bridge.json` could not be loaded or is invalid
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
        #[source]
        source: ConfigError,
    },

    /// Connecting, handshaking, or tearing down the bridge failed
    #[error("Bridge Error: {message} {location}")]
    Bridge {
        message: String,
        location: ErrorLocation,
        #[source]
        source: BridgeError,
    },
}

impl From<ConfigError> for ProbeError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        ProbeError::Config {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: error,
        }
    }
}

impl From<BridgeError> for ProbeError {
    #[track_caller]
    fn from(error: BridgeError) -> Self {
        ProbeError::Bridge {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: error,
        }
    }
}

impl From<TransportError> for ProbeError {
    #[track_caller]
    fn from(error: TransportError) -> Self {
        ProbeError::from(BridgeError::from(error))
    }
}
