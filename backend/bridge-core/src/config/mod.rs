//! `bridge.json`: where the host peer lives and how the bridge behaves.

use crate::bridge::options::BridgeOptions;
use crate::bridge::origin::normalize_origin;
use crate::error::config::ConfigError;
use crate::{DEFAULT_HANDSHAKE_TIMEOUT_MS, DEFAULT_HOST_URL};

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

const CONFIG_FILE_NAME: &str = "bridge.json";
const CONFIG_VERSION: u32 = 1;
const MAX_HANDSHAKE_TIMEOUT_MS: u64 = 60_000;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default = "default_host_url")]
    pub url: String,
    /// Origin messages are posted to and accepted from. Defaults to the origin of `url`.
    #[serde(default)]
    pub target_origin: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            url: default_host_url(),
            target_origin: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub optimistic_local_writes: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagixConfig {
    /// Magix event names to listen for.
    #[serde(default)]
    pub events: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub host: HostConfig,

    #[serde(default)]
    pub handshake: HandshakeConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub magix: MagixConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            host: HostConfig::default(),
            handshake: HandshakeConfig::default(),
            sync: SyncConfig::default(),
            magix: MagixConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_host_url() -> String {
    DEFAULT_HOST_URL.to_string()
}
fn default_timeout_ms() -> u64 {
    DEFAULT_HANDSHAKE_TIMEOUT_MS
}

// ============================================
// IMPLEMENTATION
// ============================================

impl BridgeConfig {
    /// Load config from {config_dir}/bridge.json.
    ///
    /// A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read, parsed, or validated.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                path: config_path.clone(),
                location: ErrorLocation::from(Location::caller()),
                source: e,
            }
        })?;

        let config: BridgeConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                path: config_path.clone(),
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/bridge.json via temp file + rename.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if validation, directory creation, serialization,
    /// the write, or the rename fails.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            path: config_dir.to_path_buf(),
            location: ErrorLocation::from(Location::caller()),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            message: e.to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            location: ErrorLocation::from(Location::caller()),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            path: config_path.clone(),
            location: ErrorLocation::from(Location::caller()),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(invalid(format!(
                "Invalid version: {} (expected 1-{})",
                self.version, CONFIG_VERSION
            )));
        }

        if self.handshake.timeout_ms == 0 || self.handshake.timeout_ms > MAX_HANDSHAKE_TIMEOUT_MS
        {
            return Err(invalid(format!(
                "Invalid handshake timeout: {}ms (must be 1-{})",
                self.handshake.timeout_ms, MAX_HANDSHAKE_TIMEOUT_MS
            )));
        }

        let url = Url::parse(&self.host.url)
            .map_err(|e| invalid(format!("Invalid host URL '{}': {}", self.host.url, e)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(invalid(format!(
                "Host URL must use ws:// or wss://, got {}",
                self.host.url
            )));
        }

        if let Some(ref origin) = self.host.target_origin {
            normalize_origin(origin)
                .map_err(|e| invalid(format!("Invalid target origin '{origin}': {e}")))?;
        }

        if self.magix.events.iter().any(|event| event.trim().is_empty()) {
            return Err(invalid("Magix event names cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Explicit target origin, or the origin of the host URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if neither yields a usable origin.
    pub fn resolved_target_origin(&self) -> Result<String, ConfigError> {
        let raw = self
            .host
            .target_origin
            .as_deref()
            .unwrap_or(self.host.url.as_str());

        normalize_origin(raw).map_err(|e| invalid(format!("Invalid target origin '{raw}': {e}")))
    }

    pub fn options(&self) -> BridgeOptions {
        BridgeOptions::default()
            .with_handshake_timeout(Duration::from_millis(self.handshake.timeout_ms))
            .with_optimistic_local_writes(self.sync.optimistic_local_writes)
    }
}

#[track_caller]
fn invalid(message: String) -> ConfigError {
    ConfigError::ValidationError {
        message,
        location: ErrorLocation::from(Location::caller()),
    }
}
