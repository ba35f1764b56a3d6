//! Error handling for the engine.
//! One error enum per subsystem, `thiserror` only, folded into [`EcError`].

pub mod config_error;
pub mod consensus_error;
pub mod ledger_error;
pub mod signing_error;

pub use config_error::ConfigError;
pub use consensus_error::ConsensusError;
pub use ledger_error::LedgerError;
pub use signing_error::SigningError;

/// Result alias used across the workspace.
pub type EcResult<T> = Result<T, EcError>;

/// Top-level error for every fallible engine operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EcError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("malformed reference '{value}': {reason}")]
    MalformedReference { value: String, reason: String },

    #[error("broadcast failed: {0}")]
    Broadcast(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl EcError {
    /// Whether the failure only means "no verdict yet" and the call should be
    /// repeated once more of the ledger is locally visible.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EcError::Ledger(e) if e.is_retryable())
    }
}

impl From<serde_json::Error> for EcError {
    fn from(e: serde_json::Error) -> Self {
        EcError::Serialization(e.to_string())
    }
}
