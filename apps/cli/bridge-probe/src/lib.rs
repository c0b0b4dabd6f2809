// Library exports for testing
// The binary (main.rs) imports these as well

pub mod error;
pub mod logger;
pub mod probe;

#[cfg(test)]
mod tests;

use crate::error::ProbeError;

use common::ErrorLocation;

use std::panic::Location;
use std::path::PathBuf;

/// Directory under the platform config dir holding `bridge.json` and `logs/`.
pub const CONFIG_DIR_NAME: &str = "iframe-bridge";

/// `{platform config dir}/iframe-bridge`.
///
/// # Errors
///
/// Returns [`ProbeError::Probe`] if the platform has no config directory.
pub fn default_config_dir() -> Result<PathBuf, ProbeError> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or_else(|| ProbeError::Probe {
            message: "No platform config directory; pass one as the first argument".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
}
