//! Top-level configuration with layered resolution.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ConsensusConfig, LedgerConfig, PersistenceConfig};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`EC_*`)
/// 2. TOML file passed to [`EcConfig::load`]
/// 3. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EcConfig {
    pub consensus: ConsensusConfig,
    pub ledger: LedgerConfig,
    pub persistence: PersistenceConfig,
}

impl EcConfig {
    /// Load configuration from an optional TOML file plus the process
    /// environment, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Apply `EC_*` overrides using `lookup` to read variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("EC_AGGRESSIVITY") {
            self.consensus.aggressivity = parse_env("EC_AGGRESSIVITY", &value)?;
        }
        if let Some(value) = lookup("EC_PUBLISH_DAMPING") {
            self.consensus.publish_damping = parse_env("EC_PUBLISH_DAMPING", &value)?;
        }
        if let Some(value) = lookup("EC_CONFIRMATION_CONFIDENCE") {
            self.consensus.confirmation_confidence =
                parse_env("EC_CONFIRMATION_CONFIDENCE", &value)?;
        }
        if let Some(value) = lookup("EC_PERSISTENCE_PATH") {
            debug!(key = "EC_PERSISTENCE_PATH", value = %value, "config override from environment");
            self.persistence.path = PathBuf::from(value);
        }
        Ok(())
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let consensus = &self.consensus;
        if !(consensus.aggressivity > 0.0 && consensus.aggressivity.is_finite()) {
            return Err(invalid("consensus.aggressivity", "must be a positive number"));
        }
        if !(consensus.publish_damping >= 1.0 && consensus.publish_damping.is_finite()) {
            return Err(invalid("consensus.publish_damping", "must be at least 1.0"));
        }
        if !(0.0..=1.0).contains(&consensus.confirmation_confidence) {
            return Err(invalid(
                "consensus.confirmation_confidence",
                "must be between 0.0 and 1.0",
            ));
        }
        if self.ledger.max_transfer_records == 0 {
            return Err(invalid("ledger.max_transfer_records", "must be greater than 0"));
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    match value.trim().parse() {
        Ok(parsed) => {
            debug!(key, value, "config override from environment");
            Ok(parsed)
        }
        Err(_) => {
            warn!(key, value, "unparsable environment override");
            Err(invalid(key, &format!("cannot parse '{value}'")))
        }
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}
