//! Memo types for the validator caches.

use ec_core::errors::LedgerError;
use ec_core::models::Reference;

/// Structural verdict for the ancestry of one record.
///
/// Ancestry is immutable, so `Valid` and `Invalid` hold for every root set the
/// record appears in. `Unresolved` only remembers which record blocked the
/// last attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(LedgerError),
    Unresolved { missing: Reference },
}

/// Order-independent key for a set of roots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryKey(Vec<Reference>);

impl HistoryKey {
    pub fn new(roots: &[Reference]) -> Self {
        let mut roots = roots.to_vec();
        roots.sort_unstable();
        roots.dedup();
        Self(roots)
    }

    pub fn references(&self) -> &[Reference] {
        &self.0
    }
}
