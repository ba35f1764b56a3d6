use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where the roster and watched transfers are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// JSON state file. Default: `ec-state.json`.
    pub path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("ec-state.json"),
        }
    }
}
