//! Per-history bookkeeping inside an observer.

use std::collections::HashSet;

use ec_core::models::{CandidateHistory, Confidence, Reference, Transaction};
use ec_core::traits::LedgerLink;

/// What one observer has said about one candidate history, plus the part of
/// that history's ancestry seen locally so far.
///
/// `referenced` and `missing` are disjoint. Their union only grows: a
/// missing record moves to `referenced` once it shows up.
#[derive(Debug, Clone)]
pub struct SubTangle {
    history: CandidateHistory,
    last_index: u32,
    confidence: Confidence,
    referenced: HashSet<Reference>,
    missing: HashSet<Reference>,
    seq: u64,
}

impl SubTangle {
    pub(crate) fn new(
        history: CandidateHistory,
        index: u32,
        confidence: f64,
        seq: u64,
        ledger: &dyn LedgerLink,
    ) -> Self {
        let mut sub_tangle = Self {
            history,
            last_index: index,
            confidence: Confidence::new(confidence),
            referenced: HashSet::new(),
            missing: HashSet::new(),
            seq,
        };
        sub_tangle.absorb(&history.references(), ledger);
        sub_tangle
    }

    pub fn history(&self) -> CandidateHistory {
        self.history
    }

    /// Highest marker index accepted for this history.
    pub fn last_index(&self) -> u32 {
        self.last_index
    }

    pub fn confidence(&self) -> f64 {
        self.confidence.value()
    }

    /// Insertion order, used to break confidence ties.
    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    /// Whether `reference` belongs to this history, seen or not.
    pub fn covers(&self, reference: &Reference) -> bool {
        self.referenced.contains(reference) || self.missing.contains(reference)
    }

    pub fn is_referenced(&self, reference: &Reference) -> bool {
        self.referenced.contains(reference)
    }

    pub fn missing(&self) -> impl Iterator<Item = &Reference> {
        self.missing.iter()
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub(crate) fn update(&mut self, index: u32, confidence: f64) {
        self.last_index = index;
        self.confidence = Confidence::new(confidence);
    }

    /// Record a newly visible transaction. Returns `true` if it was one of
    /// the missing records, in which case its ancestry is pulled in too.
    pub(crate) fn on_transaction(&mut self, transaction: &Transaction, ledger: &dyn LedgerLink) -> bool {
        if !self.missing.remove(&transaction.id) {
            return false;
        }
        self.referenced.insert(transaction.id);
        self.absorb(&transaction.parents(), ledger);
        true
    }

    /// Classify every not yet referenced ancestor reachable from `start`.
    fn absorb(&mut self, start: &[Reference], ledger: &dyn LedgerLink) {
        let mut stack = start.to_vec();
        while let Some(reference) = stack.pop() {
            if reference.is_genesis() || self.referenced.contains(&reference) {
                continue;
            }
            match ledger.resolve(&reference) {
                Some(transaction) => {
                    self.missing.remove(&reference);
                    self.referenced.insert(reference);
                    stack.extend(transaction.parents());
                }
                None => {
                    self.missing.insert(reference);
                }
            }
        }
    }
}
