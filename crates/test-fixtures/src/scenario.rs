use std::collections::HashMap;
use std::sync::Arc;

use ec_core::config::LedgerConfig;
use ec_core::models::{Address, Reference, Tag, Transaction};
use ec_ledger::{LedgerValidator, MemoryLedger, TransferBuilder};

use crate::{address, key};

/// An in-memory ledger plus the initial balances a test funds it with.
pub struct LedgerScenario {
    pub ledger: Arc<MemoryLedger>,
    pub balances: HashMap<Address, i128>,
}

impl Default for LedgerScenario {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerScenario {
    pub fn new() -> Self {
        Self {
            ledger: Arc::new(MemoryLedger::new()),
            balances: HashMap::new(),
        }
    }

    /// Give the address of `key(seed)` an initial balance.
    pub fn fund(mut self, seed: u8, amount: i128) -> Self {
        *self.balances.entry(address(seed)).or_insert(0) += amount;
        self
    }

    /// Build, without storing, a transfer of `amount` from `key(from)`.
    pub fn transfer(&self, from: u8, to: Address, amount: i64, tips: (Reference, Reference)) -> Vec<Transaction> {
        TransferBuilder::new()
            .input(&key(from), amount)
            .output(to, amount, Tag::from_label("FIXTURE"))
            .tips(tips.0, tips.1)
            .build()
            .unwrap_or_else(|e| panic!("failed to build fixture transfer: {e}"))
    }

    /// Store a transfer on top of genesis silently; returns its head.
    pub fn pay(&self, from: u8, to: Address, amount: i64) -> Reference {
        self.pay_on(from, to, amount, (Reference::GENESIS, Reference::GENESIS))
    }

    /// Store a transfer on top of `tips` silently; returns its head.
    pub fn pay_on(&self, from: u8, to: Address, amount: i64, tips: (Reference, Reference)) -> Reference {
        let records = self.transfer(from, to, amount, tips);
        let head = records[0].id;
        self.ledger.store_all(records);
        head
    }

    /// A validator over this ledger seeded with the funded balances.
    pub fn validator(&self) -> LedgerValidator {
        LedgerValidator::with_initial_balances(
            self.ledger.clone(),
            LedgerConfig::default(),
            self.balances.clone(),
        )
    }
}
