use crate::config::BridgeConfig;
use crate::error::config::ConfigError;
use crate::{DEFAULT_HANDSHAKE_TIMEOUT_MS, DEFAULT_HOST_URL};

use std::time::Duration;

use tempfile::TempDir;

#[test]
fn given_missing_file_when_loading_then_returns_defaults() {
    // GIVEN: An empty config directory
    let dir = TempDir::new().expect("temp dir");

    // WHEN: Loading
    let config = BridgeConfig::load(dir.path()).expect("missing file is not an error");

    // THEN: Defaults
    assert_eq!(config, BridgeConfig::default());
    assert_eq!(config.host.url, DEFAULT_HOST_URL);
    assert_eq!(config.handshake.timeout_ms, DEFAULT_HANDSHAKE_TIMEOUT_MS);
    assert!(!config.sync.optimistic_local_writes);
}

/// **VALUE**: Verifies a saved config loads back unchanged and leaves no temp file.
///
/// **BUG THIS CATCHES**: Would catch if the atomic rename step was skipped or the
/// temp file name collided with the real one.
#[test]
fn given_saved_config_when_loading_then_matches_and_temp_file_is_gone() {
    // GIVEN: A customized config saved to disk
    let dir = TempDir::new().expect("temp dir");
    let mut config = BridgeConfig::default();
    config.host.url = "wss://host.example.com/bridge".to_string();
    config.host.target_origin = Some("https://host.example.com".to_string());
    config.handshake.timeout_ms = 1500;
    config.sync.optimistic_local_writes = true;
    config.magix.events = vec!["nextPage".to_string()];
    config.save(dir.path()).expect("save should succeed");

    // WHEN: Loading
    let loaded = BridgeConfig::load(dir.path()).expect("load should succeed");

    // THEN: Same values; no temp file left behind
    assert_eq!(loaded, config);
    assert!(dir.path().join("bridge.json").exists());
    assert!(!dir.path().join("bridge.json.tmp").exists());
}

#[test]
fn given_partial_file_when_loading_then_fills_defaults() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(
        dir.path().join("bridge.json"),
        r#"{"handshake": {"timeout_ms": 900}}"#,
    )
    .expect("write config");

    let config = BridgeConfig::load(dir.path()).expect("partial config is valid");

    assert_eq!(config.version, 1);
    assert_eq!(config.handshake.timeout_ms, 900);
    assert_eq!(config.host.url, DEFAULT_HOST_URL);
}

#[test]
fn given_corrupt_file_when_loading_then_returns_parse_error() {
    let dir = TempDir::new().expect("temp dir");
    std::fs::write(dir.path().join("bridge.json"), "{not json").expect("write config");

    let result = BridgeConfig::load(dir.path());

    assert!(matches!(result, Err(ConfigError::ParseError { .. })));
}

#[test]
fn given_out_of_range_timeout_when_validating_then_returns_validation_error() {
    // GIVEN: Timeouts at both bad edges
    let mut zero = BridgeConfig::default();
    zero.handshake.timeout_ms = 0;
    let mut huge = BridgeConfig::default();
    huge.handshake.timeout_ms = 60_001;

    // WHEN/THEN: Both rejected
    assert!(matches!(zero.validate(), Err(ConfigError::ValidationError { .. })));
    assert!(matches!(huge.validate(), Err(ConfigError::ValidationError { .. })));
}

#[test]
fn given_http_host_url_when_validating_then_returns_validation_error() {
    let mut config = BridgeConfig::default();
    config.host.url = "http://127.0.0.1:19876".to_string();

    match config.validate() {
        Err(ConfigError::ValidationError { message, .. }) => assert!(message.contains("ws://")),
        other => panic!("Expected ValidationError, got {other:?}"),
    }
}

#[test]
fn given_empty_magix_event_name_when_validating_then_returns_validation_error() {
    let mut config = BridgeConfig::default();
    config.magix.events = vec!["ok".to_string(), "  ".to_string()];

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError { .. })
    ));
}

#[test]
fn given_invalid_config_when_saving_then_nothing_is_written() {
    let dir = TempDir::new().expect("temp dir");
    let mut config = BridgeConfig::default();
    config.version = 2;

    let result = config.save(dir.path());

    assert!(matches!(result, Err(ConfigError::ValidationError { .. })));
    assert!(!dir.path().join("bridge.json").exists());
}

/// **VALUE**: Verifies the target origin falls back to the host URL's origin,
/// so the bridge accepts the frames `WsPort` tags with that origin.
#[test]
fn given_no_explicit_origin_when_resolving_then_uses_host_url_origin() {
    // GIVEN: Default host URL, then an explicit override
    let implicit = BridgeConfig::default();
    let mut explicit = BridgeConfig::default();
    explicit.host.target_origin = Some("https://host.example.com/deck".to_string());

    // WHEN/THEN: Origin of the URL, or the normalized override
    assert_eq!(
        implicit.resolved_target_origin().expect("default URL has an origin"),
        "ws://127.0.0.1:19876"
    );
    assert_eq!(
        explicit.resolved_target_origin().expect("override is valid"),
        "https://host.example.com"
    );
}

#[test]
fn given_config_when_building_options_then_carries_timeout_and_write_mode() {
    let mut config = BridgeConfig::default();
    config.handshake.timeout_ms = 750;
    config.sync.optimistic_local_writes = true;

    let options = config.options();

    assert_eq!(options.handshake_timeout, Duration::from_millis(750));
    assert!(options.optimistic_local_writes);
}
