use common::ErrorLocation;

use std::io::Error as IoError;
use std::path::PathBuf;

use thiserror::Error as ThisError;

/// Failures loading, saving, or validating `bridge.json`.
#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("Config Read Error: {path}: {source} {location}")]
    ReadError {
        path: PathBuf,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Config Parse Error: {path}: {message} {location}")]
    ParseError {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
    },

    #[error("Config Write Error: {path}: {source} {location}")]
    WriteError {
        path: PathBuf,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Config Serialize Error: {message} {location}")]
    SerializeError {
        message: String,
        location: ErrorLocation,
    },

    #[error("Config Validation Error: {message} {location}")]
    ValidationError {
        message: String,
        location: ErrorLocation,
    },
}
