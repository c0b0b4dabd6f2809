//! Logging for the probe binary.
//!
//! Colored stdout plus a plain `bridge-probe.log`, installed once per process.
//! The level comes from `BRIDGE_PROBE_LOG` when set, else the build default.

use crate::error::ProbeError;

use common::ErrorLocation;

use std::io::stdout;
use std::panic::Location;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

static INIT_LOGGER_ONCE: Once = Once::new();

static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

const LOG_FILE_NAME: &str = "bridge-probe.log";

/// Environment variable overriding the log level (`error`, `warn`, `info`, `debug`, `trace`, `off`).
pub const LOG_LEVEL_ENV: &str = "BRIDGE_PROBE_LOG";

#[cfg(debug_assertions)]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

#[cfg(not(debug_assertions))]
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Install the global logger. Later calls warn and return `Ok`.
///
/// # Errors
///
/// Returns [`ProbeError::Probe`] if the log file cannot be created or a
/// logger is already installed by someone else.
pub fn initialize(log_dir: &Path) -> Result<(), ProbeError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("Logger already initialized");
        return Ok(());
    }

    let level = level_from_env();
    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = build_dispatch(log_dir, level).and_then(|dispatch| {
            dispatch.apply().map_err(|e| ProbeError::Probe {
                message: format!("Failed to initialize logger: {e}"),
                location: ErrorLocation::from(Location::caller()),
            })
        });
        if result.is_ok() {
            info!("Logger initialized with level: {level:?}");
        }
    });

    result
}

/// Level from `BRIDGE_PROBE_LOG`, or the build default.
pub fn level_from_env() -> LevelFilter {
    resolve_level(std::env::var(LOG_LEVEL_ENV).ok().as_deref())
}

/// Parse a level name; unknown or missing values fall back to the build default.
pub fn resolve_level(raw: Option<&str>) -> LevelFilter {
    raw.and_then(|value| value.trim().parse::<LevelFilter>().ok())
        .unwrap_or(DEFAULT_LOG_LEVEL)
}

/// Stdout and file dispatch at `level`, not yet installed.
///
/// # Errors
///
/// Returns [`ProbeError::Probe`] if the log file cannot be opened.
#[track_caller]
pub fn build_dispatch(log_dir: &Path, level: LevelFilter) -> Result<Dispatch, ProbeError> {
    let log_file = fern::log_file(log_dir.join(LOG_FILE_NAME)).map_err(|e| ProbeError::Probe {
        message: format!("Failed to create log file in {}: {e}", log_dir.display()),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let colors = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let stdout_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} - {}] {} [{}:{}]",
                format_rfc3339(SystemTime::now()),
                colors.color(record.level()),
                message,
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
            ))
        })
        .chain(stdout());

    let file_dispatch = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} - {}] {} [{}:{}]",
                format_rfc3339(SystemTime::now()),
                record.level(),
                message,
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
            ))
        })
        .chain(log_file);

    Ok(Dispatch::new()
        .level(level)
        .chain(stdout_dispatch)
        .chain(file_dispatch))
}
