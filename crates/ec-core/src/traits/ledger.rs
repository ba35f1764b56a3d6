use std::sync::Weak;

use crate::errors::EcResult;
use crate::models::{Address, Reference, Transaction};

/// Read access to the ledger plus the broadcast capability.
///
/// A lookup miss is not an error: it means the record is not locally visible
/// yet. Implementations must be safe to call from many threads.
pub trait LedgerLink: Send + Sync {
    /// Resolve a reference to its record, if locally visible.
    fn resolve(&self, reference: &Reference) -> Option<Transaction>;

    /// Every locally visible record on `address`.
    fn find_by_address(&self, address: &Address) -> Vec<Transaction>;

    /// Submit a record to the network. Listeners are notified once it is
    /// locally visible.
    fn broadcast(&self, transaction: Transaction) -> EcResult<()>;

    /// Register a listener for newly visible records. Held weakly so that a
    /// listener owning the ledger does not form a cycle.
    fn subscribe(&self, listener: Weak<dyn LedgerListener>);
}

/// Receives every record that becomes locally visible.
pub trait LedgerListener: Send + Sync {
    fn on_transaction(&self, transaction: &Transaction);
}
