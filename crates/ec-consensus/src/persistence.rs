//! JSON persistence of the trust roster and watched transfers.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ec_core::errors::{EcError, EcResult};
use ec_core::models::Reference;

use crate::cluster::RosterEntry;

/// What survives a restart. Signing keys are not part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub trusted: Vec<RosterEntry>,
    #[serde(default)]
    pub transfers: Vec<Reference>,
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl PersistedState {
    pub fn new(trusted: Vec<RosterEntry>, transfers: Vec<Reference>) -> Self {
        Self {
            trusted,
            transfers,
            saved_at: Utc::now(),
        }
    }

    /// Write to `path`, replacing any previous file.
    pub fn store(&self, path: &Path) -> EcResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, json)
            .map_err(|e| EcError::Persistence(format!("{}: {e}", staging.display())))?;
        std::fs::rename(&staging, path)
            .map_err(|e| EcError::Persistence(format!("{}: {e}", path.display())))?;
        info!(
            path = %path.display(),
            trusted = self.trusted.len(),
            transfers = self.transfers.len(),
            "state saved"
        );
        Ok(())
    }

    /// Read from `path`. A missing file is an empty state.
    pub fn load(path: &Path) -> EcResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no saved state");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| EcError::Persistence(format!("{}: {e}", path.display())))?;
        let state: Self = serde_json::from_str(&content)?;
        Ok(state)
    }
}
