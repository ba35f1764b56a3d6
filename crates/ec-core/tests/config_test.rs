//! Config tests: defaults, TOML parsing, env layering, validation.

use std::collections::HashMap;

use ec_core::config::EcConfig;
use ec_core::errors::ConfigError;

#[test]
fn defaults_are_valid() {
    let config = EcConfig::default();
    assert!(config.validate().is_ok());
    assert!(config.consensus.resync_on_join);
    assert_eq!(config.ledger.max_transfer_records, 64);
}

#[test]
fn partial_toml_keeps_remaining_defaults() {
    let config = EcConfig::from_toml(
        r#"
        [consensus]
        aggressivity = 2.0
        "#,
    )
    .unwrap();
    assert!((config.consensus.aggressivity - 2.0).abs() < f64::EPSILON);
    assert!((config.consensus.publish_damping - 20.0).abs() < f64::EPSILON);
    assert!((config.consensus.confirmation_confidence - 0.95).abs() < f64::EPSILON);
}

#[test]
fn invalid_toml_is_a_parse_error() {
    let err = EcConfig::from_toml("[consensus\naggressivity = ").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { .. }));
}

#[test]
fn non_positive_aggressivity_is_rejected() {
    let err = EcConfig::from_toml("[consensus]\naggressivity = 0.0").unwrap_err();
    assert!(matches!(err, ConfigError::ValidationFailed { ref field, .. } if field == "consensus.aggressivity"));
}

#[test]
fn env_overrides_win_over_file_values() {
    let mut config = EcConfig::from_toml("[consensus]\naggressivity = 2.0").unwrap();
    let env: HashMap<&str, &str> = HashMap::from([
        ("EC_AGGRESSIVITY", "3.5"),
        ("EC_PERSISTENCE_PATH", "/tmp/ec.json"),
    ]);
    config
        .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
        .unwrap();
    assert!((config.consensus.aggressivity - 3.5).abs() < f64::EPSILON);
    assert_eq!(config.persistence.path.to_str(), Some("/tmp/ec.json"));
}

#[test]
fn unparsable_env_value_is_rejected() {
    let mut config = EcConfig::default();
    let err = config
        .apply_env_overrides(|key| (key == "EC_PUBLISH_DAMPING").then(|| "fast".to_string()))
        .unwrap_err();
    assert!(matches!(err, ConfigError::ValidationFailed { .. }));
}

#[test]
fn missing_file_is_reported() {
    let err = EcConfig::load(Some(std::path::Path::new("/nonexistent/ec.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { .. }));
}
