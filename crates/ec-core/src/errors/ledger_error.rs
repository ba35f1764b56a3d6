use crate::models::{Address, Reference};

/// Ledger validation errors.
///
/// Only [`LedgerError::IncompleteHistory`] is retryable; every other variant
/// is a permanent verdict for the history it was raised on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("history incomplete: missing record {missing}")]
    IncompleteHistory { missing: Reference },

    #[error("invalid signature in transfer {head}")]
    InvalidSignature { head: Reference },

    #[error("transfer {head} does not balance: sum {sum}")]
    InvalidTransferSum { head: Reference, sum: i128 },

    #[error("malformed transfer {head}: {reason}")]
    MalformedTransfer { head: Reference, reason: String },

    #[error("record {reference} does not match its content hash")]
    MalformedRecord { reference: Reference },

    #[error("record {reference} moves value outside any transfer in this history")]
    OrphanValueRecord { reference: Reference },

    #[error("address {address} ends with negative balance {balance}")]
    NegativeBalance { address: Address, balance: i128 },

    #[error("balance overflow on address {address}")]
    BalanceOverflow { address: Address },

    #[error("insufficient balance on {address}: balance {balance} < value {value}")]
    InsufficientBalance {
        address: Address,
        balance: i128,
        value: i64,
    },
}

impl LedgerError {
    /// `true` when the error names a record that may still arrive.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::IncompleteHistory { .. })
    }

    /// The record whose absence blocked validation, if any.
    pub fn missing_reference(&self) -> Option<&Reference> {
        match self {
            LedgerError::IncompleteHistory { missing } => Some(missing),
            _ => None,
        }
    }
}
