//! Recursive validation of candidate histories.
//!
//! Structural verdicts (record integrity, atomic transfers) are memoized per
//! record and never expire: a record's ancestry cannot change. Financial
//! verdicts depend on the whole root set and the initial balances, so they
//! are cached per [`HistoryKey`] and dropped whenever balances change.
//! Incomplete outcomes are never cached as verdicts.

mod memo;

pub use memo::{HistoryKey, Verdict};

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;
use tracing::{debug, instrument, warn};

use ec_core::config::LedgerConfig;
use ec_core::errors::LedgerError;
use ec_core::models::{Address, CandidateHistory, Reference, Transaction};
use ec_core::traits::LedgerLink;

use crate::transfer::{collect_transfer, transfer_essence};

/// Validates histories reachable from a set of root references.
pub struct LedgerValidator {
    ledger: Arc<dyn LedgerLink>,
    config: LedgerConfig,
    initial_balances: RwLock<HashMap<Address, i128>>,
    structure: DashMap<Reference, Verdict>,
    transfers: DashMap<Reference, Result<(), LedgerError>>,
    solidity: DashMap<HistoryKey, Result<(), LedgerError>>,
}

impl LedgerValidator {
    pub fn new(ledger: Arc<dyn LedgerLink>, config: LedgerConfig) -> Self {
        Self::with_initial_balances(ledger, config, HashMap::new())
    }

    pub fn with_initial_balances(
        ledger: Arc<dyn LedgerLink>,
        config: LedgerConfig,
        initial_balances: HashMap<Address, i128>,
    ) -> Self {
        Self {
            ledger,
            config,
            initial_balances: RwLock::new(initial_balances),
            structure: DashMap::new(),
            transfers: DashMap::new(),
            solidity: DashMap::new(),
        }
    }

    /// Add `delta` to the balance `address` holds before any record.
    /// Invalidates every cached financial verdict.
    pub fn change_initial_balance(&self, address: Address, delta: i128) {
        let mut balances = self
            .initial_balances
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = balances.entry(address).or_insert(0);
        *entry = entry.saturating_add(delta);
        let balance = *entry;
        drop(balances);
        self.solidity.clear();
        debug!(address = %address, delta, balance, "initial balance changed");
    }

    pub fn initial_balances(&self) -> HashMap<Address, i128> {
        self.initial_balances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Memoized structural verdict for `reference`, if any.
    pub fn verdict(&self, reference: &Reference) -> Option<Verdict> {
        self.structure.get(reference).map(|entry| entry.value().clone())
    }

    /// Check that everything reachable from `root` is present, intact, and
    /// that every atomic transfer in it balances with valid signatures.
    #[instrument(skip(self, root), fields(root = %root))]
    pub fn check_structure(&self, root: Reference) -> Result<(), LedgerError> {
        if root.is_genesis() {
            return Ok(());
        }
        match self.verdict(&root) {
            Some(Verdict::Valid) => return Ok(()),
            Some(Verdict::Invalid(error)) => return Err(error),
            Some(Verdict::Unresolved { missing }) => {
                if self.ledger.resolve(&missing).is_none() {
                    return Err(LedgerError::IncompleteHistory { missing });
                }
                debug!(missing = %missing, "blocking record arrived, revalidating");
            }
            None => {}
        }

        match self.traverse(root) {
            Ok(traversed) => {
                for reference in traversed {
                    self.structure.insert(reference, Verdict::Valid);
                }
                Ok(())
            }
            Err(LedgerError::IncompleteHistory { missing }) => {
                debug!(missing = %missing, "history incomplete");
                self.structure
                    .insert(root, Verdict::Unresolved { missing });
                Err(LedgerError::IncompleteHistory { missing })
            }
            Err(error) => {
                warn!(error = %error, "history structurally invalid");
                self.structure.insert(root, Verdict::Invalid(error.clone()));
                Err(error)
            }
        }
    }

    /// Walk every distinct ancestor of `root` once, stopping at settled
    /// verdicts. Returns the records checked on this walk.
    fn traverse(&self, root: Reference) -> Result<Vec<Reference>, LedgerError> {
        let mut stack = vec![root];
        let mut seen = HashSet::new();
        let mut traversed = Vec::new();

        while let Some(reference) = stack.pop() {
            if reference.is_genesis() || !seen.insert(reference) {
                continue;
            }
            match self.verdict(&reference) {
                Some(Verdict::Valid) => continue,
                Some(Verdict::Invalid(error)) => return Err(error),
                _ => {}
            }
            let transaction = self
                .ledger
                .resolve(&reference)
                .ok_or(LedgerError::IncompleteHistory { missing: reference })?;
            if let Err(error) = self.check_record(reference, &transaction) {
                if !error.is_retryable() {
                    self.structure
                        .insert(reference, Verdict::Invalid(error.clone()));
                }
                return Err(error);
            }
            traversed.push(reference);
            stack.push(transaction.parent2);
            stack.push(transaction.parent1);
        }
        Ok(traversed)
    }

    fn check_record(&self, reference: Reference, transaction: &Transaction) -> Result<(), LedgerError> {
        if transaction.id != reference || !transaction.is_sealed() {
            return Err(LedgerError::MalformedRecord { reference });
        }
        if transaction.is_atomic_head && !transaction.is_zero_value_single() {
            self.check_transfer(transaction)?;
        }
        Ok(())
    }

    /// Root-independent transfer verdict, memoized unless incomplete.
    fn check_transfer(&self, head: &Transaction) -> Result<(), LedgerError> {
        if let Some(cached) = self.transfers.get(&head.id).map(|entry| entry.value().clone()) {
            return cached;
        }
        let result = self.validate_transfer(head);
        match &result {
            Err(error) if error.is_retryable() => {}
            Err(error) => {
                warn!(head = %head.id, error = %error, "invalid atomic transfer");
                self.transfers.insert(head.id, result.clone());
            }
            Ok(()) => {
                self.transfers.insert(head.id, Ok(()));
            }
        }
        result
    }

    fn validate_transfer(&self, head: &Transaction) -> Result<(), LedgerError> {
        let records = collect_transfer(head, &*self.ledger, self.config.max_transfer_records)?;
        let sum: i128 = records.iter().map(|record| i128::from(record.value)).sum();
        if sum != 0 {
            return Err(LedgerError::InvalidTransferSum { head: head.id, sum });
        }
        let essence = transfer_essence(&records);
        for input in records.iter().filter(|record| record.value < 0) {
            let signed = input
                .signature
                .is_some_and(|signature| signature.verify(&input.address, &essence));
            if !signed {
                return Err(LedgerError::InvalidSignature { head: head.id });
            }
        }
        Ok(())
    }

    /// `Ok(false)` when structurally invalid, `Err` only when incomplete.
    pub fn is_history_structurally_valid(&self, roots: &[Reference]) -> Result<bool, LedgerError> {
        for root in HistoryKey::new(roots).references() {
            match self.check_structure(*root) {
                Ok(()) => {}
                Err(error) if error.is_retryable() => return Err(error),
                Err(_) => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Final balance of every address touched by the history, seeded with
    /// the initial balances. Every reachable record is counted exactly once.
    ///
    /// Value may only move inside a transfer whose head is part of the same
    /// history; any other value-bearing record is an
    /// [`LedgerError::OrphanValueRecord`].
    pub fn balances(&self, roots: &[Reference]) -> Result<HashMap<Address, i128>, LedgerError> {
        let mut balances = self.initial_balances();
        let mut stack: Vec<Reference> = roots.to_vec();
        let mut seen = HashSet::new();
        let mut moved = BTreeSet::new();
        let mut covered = HashSet::new();

        while let Some(reference) = stack.pop() {
            if reference.is_genesis() || !seen.insert(reference) {
                continue;
            }
            let transaction = self
                .ledger
                .resolve(&reference)
                .ok_or(LedgerError::IncompleteHistory { missing: reference })?;
            if transaction.is_atomic_head && !transaction.is_zero_value_single() {
                let records =
                    collect_transfer(&transaction, &*self.ledger, self.config.max_transfer_records)?;
                covered.extend(records.iter().map(|record| record.id));
            }
            if transaction.value != 0 {
                moved.insert(reference);
                let address = transaction.address;
                let balance = balances.entry(address).or_insert(0);
                *balance = balance
                    .checked_add(i128::from(transaction.value))
                    .ok_or(LedgerError::BalanceOverflow { address })?;
            }
            stack.push(transaction.parent2);
            stack.push(transaction.parent1);
        }

        if let Some(orphan) = moved.into_iter().find(|reference| !covered.contains(reference)) {
            debug!(record = %orphan, "value moved outside a transfer");
            return Err(LedgerError::OrphanValueRecord { reference: orphan });
        }
        Ok(balances)
    }

    /// Full verdict: structure first, then no address may end negative.
    pub fn check_history(&self, roots: &[Reference]) -> Result<(), LedgerError> {
        let key = HistoryKey::new(roots);
        if let Some(cached) = self.solidity.get(&key).map(|entry| entry.value().clone()) {
            return cached;
        }
        let result = self.evaluate(&key);
        if !matches!(&result, Err(error) if error.is_retryable()) {
            self.solidity.insert(key, result.clone());
        }
        result
    }

    fn evaluate(&self, key: &HistoryKey) -> Result<(), LedgerError> {
        for root in key.references() {
            self.check_structure(*root)?;
        }
        let balances = self.balances(key.references())?;
        let overdrawn = balances
            .into_iter()
            .filter(|(_, balance)| *balance < 0)
            .min_by_key(|(address, _)| *address);
        if let Some((address, balance)) = overdrawn {
            debug!(address = %address, balance, "history overdraws an address");
            return Err(LedgerError::NegativeBalance { address, balance });
        }
        Ok(())
    }

    /// `Ok(false)` when proven invalid, `Err` only when incomplete.
    #[instrument(skip(self, roots), fields(roots = roots.len()))]
    pub fn is_history_solid(&self, roots: &[Reference]) -> Result<bool, LedgerError> {
        match self.check_history(roots) {
            Ok(()) => Ok(true),
            Err(error) if error.is_retryable() => Err(error),
            Err(_) => Ok(false),
        }
    }

    pub fn is_candidate_solid(&self, history: &CandidateHistory) -> Result<bool, LedgerError> {
        self.is_history_solid(&history.references())
    }

    /// Whether the union of both histories is still solid.
    pub fn are_histories_compatible(
        &self,
        a: &CandidateHistory,
        b: &CandidateHistory,
    ) -> Result<bool, LedgerError> {
        if a == b {
            return self.is_candidate_solid(a);
        }
        let [a1, a2] = a.references();
        let [b1, b2] = b.references();
        self.is_history_solid(&[a1, a2, b1, b2])
    }
}
