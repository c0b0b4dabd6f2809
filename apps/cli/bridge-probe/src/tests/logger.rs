// Unit tests for logger setup
// Global logger installation is process-wide, so those tests run serially

use crate::error::ProbeError;
use crate::logger::{LOG_LEVEL_ENV, build_dispatch, initialize, level_from_env, resolve_level};

use std::path::PathBuf;

use log::LevelFilter;
use serial_test::serial;
use tempfile::TempDir;

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: Installing a second global logger is an error. Without the
/// guards, a second call from a test or a retry path would fail startup.
///
/// **BUG THIS CATCHES**: Would catch if the Once or AtomicBool guards are removed.
#[test]
#[serial]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A writable log directory
    let dir = TempDir::new().expect("temp dir");

    // WHEN: Calling initialize twice
    let first = initialize(dir.path());
    let second = initialize(dir.path());

    // THEN: Both Ok
    assert!(first.is_ok(), "First initialization should succeed: {first:?}");
    assert!(second.is_ok(), "Second initialization should be a no-op");
}

/// **VALUE**: Verifies an unusable log directory is reported, not panicked on.
///
/// **BUG THIS CATCHES**: Would catch if `fern::log_file()` were unwrapped.
#[test]
fn given_invalid_log_dir_when_building_dispatch_then_returns_probe_error() {
    // GIVEN: A path that cannot hold a file on Unix-like systems
    let invalid_dir = PathBuf::from("/dev/null/invalid-path");

    // WHEN: Building the dispatch
    let result = build_dispatch(&invalid_dir, LevelFilter::Info);

    // THEN: Probe error naming the directory
    match result {
        Err(ProbeError::Probe { message, .. }) => assert!(message.contains("invalid-path")),
        Err(other) => panic!("Expected ProbeError::Probe, got {other:?}"),
        Ok(_) => panic!("Expected an error for an invalid log directory"),
    }
}

#[test]
fn given_level_names_when_resolving_then_parses_case_insensitively() {
    assert_eq!(resolve_level(Some("warn")), LevelFilter::Warn);
    assert_eq!(resolve_level(Some(" TRACE ")), LevelFilter::Trace);
    assert_eq!(resolve_level(Some("off")), LevelFilter::Off);
}

#[test]
fn given_missing_or_unknown_level_when_resolving_then_uses_build_default() {
    let default = resolve_level(None);

    assert_eq!(resolve_level(Some("loud")), default);
    assert!(default == LevelFilter::Debug || default == LevelFilter::Info);
}

#[test]
#[serial]
fn given_env_override_when_reading_level_then_uses_it() {
    // GIVEN: The override is set
    // SAFETY: serialized with every other test touching the environment
    unsafe { std::env::set_var(LOG_LEVEL_ENV, "error") };

    // WHEN: Reading the level
    let level = level_from_env();

    // THEN: Override wins
    unsafe { std::env::remove_var(LOG_LEVEL_ENV) };
    assert_eq!(level, LevelFilter::Error);
}
