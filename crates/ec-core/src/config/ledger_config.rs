use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_TRANSFER_RECORDS;

/// Configuration for ledger validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Longest atomic transfer the validator will walk. Default: 64.
    pub max_transfer_records: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_transfer_records: DEFAULT_MAX_TRANSFER_RECORDS,
        }
    }
}
