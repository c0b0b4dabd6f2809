use bridge_probe::default_config_dir;
use bridge_probe::error::ProbeError;
use bridge_probe::logger::initialize as LoggerInitialize;
use bridge_probe::probe;

use bridge_core::config::BridgeConfig;

use common::ErrorLocation;

use std::env::args;
use std::fs::create_dir_all;
use std::panic::Location;
use std::path::PathBuf;
use std::process::ExitCode;

use log::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ProbeError> {
    let config_dir = match args().nth(1) {
        Some(dir) => PathBuf::from(dir),
        None => default_config_dir()?,
    };

    let log_dir = config_dir.join("logs");
    create_dir_all(&log_dir).map_err(|e| ProbeError::Probe {
        message: format!("Failed to create log directory: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Logger first so config errors are recorded
    LoggerInitialize(&log_dir)?;

    info!("bridge-probe starting");
    info!("Config directory: {}", config_dir.display());

    let config = BridgeConfig::load(&config_dir)?;
    let summary = probe::run(&config).await?;

    info!(
        "Session summary: {} Magix event(s), follower at shutdown: {}",
        summary.magix_events_received, summary.was_follower
    );
    Ok(())
}
