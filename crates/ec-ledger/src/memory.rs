//! In-memory ledger collaborator.

use std::sync::{Arc, PoisonError, RwLock, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use ec_core::errors::EcResult;
use ec_core::models::{Address, Reference, Transaction};
use ec_core::traits::{LedgerLink, LedgerListener};

/// A concurrent, process-local ledger.
///
/// `broadcast` makes a record visible and notifies subscribers once per
/// record. `store` makes it visible silently, which is how tests model
/// records that arrived before anybody listened.
#[derive(Default)]
pub struct MemoryLedger {
    records: DashMap<Reference, Transaction>,
    by_address: DashMap<Address, Vec<Reference>>,
    listeners: RwLock<Vec<Weak<dyn LedgerListener>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert without notifying. Returns `false` if the record was known.
    pub fn store(&self, transaction: Transaction) -> bool {
        let id = transaction.id;
        let address = transaction.address;
        match self.records.entry(id) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(slot) => {
                slot.insert(transaction);
            }
        }
        self.by_address.entry(address).or_default().push(id);
        trace!(record = %id, "stored");
        true
    }

    /// Insert several records without notifying.
    pub fn store_all(&self, transactions: impl IntoIterator<Item = Transaction>) {
        for transaction in transactions {
            self.store(transaction);
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, reference: &Reference) -> bool {
        self.records.contains_key(reference)
    }

    fn live_listeners(&self) -> Vec<Arc<dyn LedgerListener>> {
        let mut listeners = self.listeners.write().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|listener| listener.strong_count() > 0);
        listeners.iter().filter_map(Weak::upgrade).collect()
    }
}

impl LedgerLink for MemoryLedger {
    fn resolve(&self, reference: &Reference) -> Option<Transaction> {
        self.records.get(reference).map(|entry| entry.value().clone())
    }

    fn find_by_address(&self, address: &Address) -> Vec<Transaction> {
        let ids = self
            .by_address
            .get(address)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        ids.iter().filter_map(|id| self.resolve(id)).collect()
    }

    fn broadcast(&self, transaction: Transaction) -> EcResult<()> {
        if !self.store(transaction.clone()) {
            return Ok(());
        }
        let listeners = self.live_listeners();
        debug!(
            record = %transaction.id,
            listeners = listeners.len(),
            "broadcasting"
        );
        for listener in listeners {
            listener.on_transaction(&transaction);
        }
        Ok(())
    }

    fn subscribe(&self, listener: Weak<dyn LedgerListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }
}
