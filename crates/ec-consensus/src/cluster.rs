//! Cluster: the weighted roster of observers.
//!
//! Approval confidence of a reference is the trust-weighted average of every
//! member's confidence in it:
//!
//! `approval(r) = Σ trust_i × confidence_i(r) / Σ trust_i`, or 0 without trust.
//!
//! Roster mutation takes the write lock; aggregation and event fanout work on
//! a cloned snapshot of member handles and lock one observer at a time.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use ec_core::errors::{ConsensusError, EcResult};
use ec_core::models::{Address, CandidateHistory, Reference, Transaction};
use ec_core::traits::{LedgerLink, LedgerListener};

use crate::observer::{validate_trust, Observer, ObserverRole};

/// One roster line, as listed and persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub address: Address,
    pub trust: f64,
    #[serde(default)]
    pub role: ObserverRole,
}

#[derive(Clone)]
struct Member {
    address: Address,
    observer: Arc<Mutex<Observer>>,
}

impl Member {
    fn lock(&self) -> MutexGuard<'_, Observer> {
        self.observer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct Cluster {
    ledger: Arc<dyn LedgerLink>,
    roster: RwLock<Vec<Member>>,
}

impl Cluster {
    pub fn new(ledger: Arc<dyn LedgerLink>) -> Self {
        Self {
            ledger,
            roster: RwLock::new(Vec::new()),
        }
    }

    fn snapshot(&self) -> Vec<Member> {
        self.roster
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn member(&self, address: &Address) -> Option<Member> {
        self.roster
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|m| m.address == *address)
            .cloned()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.member(address).is_some()
    }

    pub fn len(&self) -> usize {
        self.roster.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add an observer with positive trust. With `resync`, markers already in
    /// the ledger on the observer's address are replayed into it.
    ///
    /// The member joins the roster before the replay and stays locked until
    /// it finishes, so markers broadcast meanwhile queue behind the replay
    /// instead of being missed.
    #[instrument(skip(self, observer), fields(observer = %observer.address(), trust = observer.trust()))]
    pub fn add_observer(&self, observer: Observer, resync: bool) -> EcResult<()> {
        let address = observer.address();
        if observer.trust() <= 0.0 {
            return Err(ConsensusError::InvalidTrust(observer.trust()).into());
        }
        let member = Member {
            address,
            observer: Arc::new(Mutex::new(observer)),
        };
        let mut joining = member.lock();

        let members = {
            let mut roster = self.roster.write().unwrap_or_else(PoisonError::into_inner);
            if roster.iter().any(|m| m.address == address) {
                return Err(ConsensusError::ObserverAlreadyRegistered(address.to_hex()).into());
            }
            roster.push(member.clone());
            roster.len()
        };

        let replayed = if resync { self.resync(&mut joining) } else { 0 };
        info!(observer = %address, replayed, members, "observer joined cluster");
        Ok(())
    }

    /// Feed markers already on the ledger into a joining observer. Markers
    /// that fail verification are skipped.
    fn resync(&self, observer: &mut Observer) -> usize {
        let mut heads: Vec<Transaction> = self
            .ledger
            .find_by_address(&observer.address())
            .into_iter()
            .filter(Transaction::is_zero_value_single)
            .collect();
        heads.sort_by_key(|tx| tx.signature.map(|s| s.index));

        let mut replayed = 0;
        for head in &heads {
            match observer.ingest_marker(head, self.ledger.as_ref()) {
                Ok(_) => replayed += 1,
                Err(error) => warn!(record = %head.id, error = %error, "skipping marker during resync"),
            }
        }
        replayed
    }

    pub fn remove_observer(&self, address: &Address) -> EcResult<()> {
        let mut roster = self.roster.write().unwrap_or_else(PoisonError::into_inner);
        let position = roster
            .iter()
            .position(|m| m.address == *address)
            .ok_or_else(|| ConsensusError::ObserverNotFound(address.to_hex()))?;
        roster.remove(position);
        info!(observer = %address, members = roster.len(), "observer left cluster");
        Ok(())
    }

    /// Trust 0 removes the observer, positive trust updates it or adds a new
    /// passive one.
    pub fn set_trust(&self, address: Address, trust: f64, resync: bool) -> EcResult<()> {
        let trust = validate_trust(trust)?;
        match self.member(&address) {
            Some(_) if trust == 0.0 => self.remove_observer(&address),
            None if trust == 0.0 => Ok(()),
            Some(member) => {
                member.lock().set_trust(trust)?;
                info!(observer = %address, trust, "trust updated");
                Ok(())
            }
            None => self.add_observer(Observer::new(address, trust)?, resync),
        }
    }

    pub fn set_role(&self, address: &Address, role: ObserverRole) -> EcResult<()> {
        let member = self
            .member(address)
            .ok_or_else(|| ConsensusError::ObserverNotFound(address.to_hex()))?;
        member.lock().set_role(role);
        Ok(())
    }

    pub fn trust_of(&self, address: &Address) -> Option<f64> {
        let member = self.member(address)?;
        let trust = member.lock().trust();
        Some(trust)
    }

    /// Trust-weighted average confidence in `reference`, within [0, 1].
    pub fn approval_confidence(&self, reference: &Reference) -> f64 {
        let mut weighted = 0.0;
        let mut total = 0.0;
        for member in self.snapshot() {
            let observer = member.lock();
            total += observer.trust();
            weighted += observer.trust() * observer.confidence_of(reference);
        }
        if total <= 0.0 {
            return 0.0;
        }
        (weighted / total).clamp(0.0, 1.0)
    }

    /// Every candidate history any member has a marker for.
    pub fn all_known_histories(&self) -> BTreeSet<CandidateHistory> {
        self.snapshot()
            .iter()
            .flat_map(|member| member.lock().histories().collect::<Vec<_>>())
            .collect()
    }

    pub fn marked_histories(&self, address: &Address) -> EcResult<BTreeMap<CandidateHistory, f64>> {
        let member = self
            .member(address)
            .ok_or_else(|| ConsensusError::ObserverNotFound(address.to_hex()))?;
        let histories = member.lock().marked_histories();
        Ok(histories)
    }

    /// Route a newly visible record: markers to their issuer first, then the
    /// record itself to every member.
    #[instrument(skip(self, transaction), fields(record = %transaction.id))]
    pub fn on_ledger_event(&self, transaction: &Transaction) {
        let members = self.snapshot();
        let ledger = self.ledger.as_ref();

        if transaction.is_zero_value_single() {
            if let Some(issuer) = members.iter().find(|m| m.address == transaction.address) {
                if let Err(error) = issuer.lock().ingest_marker(transaction, ledger) {
                    warn!(observer = %issuer.address, error = %error, "marker rejected");
                }
            }
        }
        for member in &members {
            let widened = member.lock().ingest_transaction(transaction, ledger);
            if widened > 0 {
                debug!(observer = %member.address, widened, "sub-tangles widened");
            }
        }
    }

    pub fn roster(&self) -> Vec<RosterEntry> {
        self.snapshot()
            .iter()
            .map(|member| {
                let observer = member.lock();
                RosterEntry {
                    address: observer.address(),
                    trust: observer.trust(),
                    role: observer.role(),
                }
            })
            .collect()
    }

    /// Re-apply persisted roster entries through [`Cluster::set_trust`].
    pub fn restore_roster(&self, entries: &[RosterEntry], resync: bool) -> EcResult<()> {
        for entry in entries {
            self.set_trust(entry.address, entry.trust, resync)?;
            if entry.trust > 0.0 {
                self.set_role(&entry.address, entry.role)?;
            }
        }
        Ok(())
    }
}

impl LedgerListener for Cluster {
    fn on_transaction(&self, transaction: &Transaction) {
        self.on_ledger_event(transaction);
    }
}
