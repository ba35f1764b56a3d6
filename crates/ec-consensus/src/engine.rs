//! ConsensusEngine: owns the cluster and the actors controlled by this node,
//! and exposes every operation a front end needs.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ed25519_dalek::SigningKey;
use rayon::prelude::*;
use tracing::{info, instrument};

use ec_core::config::EcConfig;
use ec_core::constants::{REMAINDER_TAG_LABEL, TRANSFER_TAG_LABEL};
use ec_core::errors::{ConsensusError, EcResult, LedgerError};
use ec_core::models::{Address, CandidateHistory, Reference, Tag};
use ec_core::traits::{LedgerLink, LedgerListener, MarkerSigner};
use ec_ledger::{address_of_key, TransferBuilder};

use crate::actor::{AutonomousActor, TickReport};
use crate::cluster::{Cluster, RosterEntry};
use crate::observer::ObserverRole;
use crate::persistence::PersistedState;

/// A funds transfer to build, sign, and broadcast.
pub struct TransferRequest {
    pub key: SigningKey,
    pub receiver: Address,
    /// Where the rest of the spender's balance goes, if anywhere.
    pub remainder: Option<Address>,
    pub value: i64,
    pub check_balance: bool,
    pub tips: (Reference, Reference),
}

/// The engine façade.
pub struct ConsensusEngine {
    config: EcConfig,
    ledger: Arc<dyn LedgerLink>,
    cluster: Arc<Cluster>,
    actors: DashMap<Address, Arc<AutonomousActor>>,
    initial_balances: RwLock<HashMap<Address, i128>>,
    watched: RwLock<BTreeSet<Reference>>,
}

impl ConsensusEngine {
    /// Create the engine and subscribe its cluster to `ledger`.
    pub fn new(ledger: Arc<dyn LedgerLink>, config: EcConfig) -> Self {
        let cluster = Arc::new(Cluster::new(ledger.clone()));
        let listener: Arc<dyn LedgerListener> = cluster.clone();
        ledger.subscribe(Arc::downgrade(&listener));
        Self {
            config,
            ledger,
            cluster,
            actors: DashMap::new(),
            initial_balances: RwLock::new(HashMap::new()),
            watched: RwLock::new(BTreeSet::new()),
        }
    }

    pub fn config(&self) -> &EcConfig {
        &self.config
    }

    pub fn cluster(&self) -> &Arc<Cluster> {
        &self.cluster
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerLink> {
        &self.ledger
    }

    pub fn approval_confidence(&self, reference: &Reference) -> f64 {
        self.cluster.approval_confidence(reference)
    }

    pub fn is_confirmed(&self, reference: &Reference) -> bool {
        self.approval_confidence(reference) > self.config.consensus.confirmation_confidence
    }

    // -- actors --

    /// Start voting with `signer`. Returns the actor's address.
    #[instrument(skip(self, signer))]
    pub fn create_actor(&self, signer: Arc<dyn MarkerSigner>) -> EcResult<Address> {
        let address = signer.address();
        match self.actors.entry(address) {
            Entry::Occupied(_) => {
                return Err(ConsensusError::ActorAlreadyControlled(address.to_hex()).into())
            }
            Entry::Vacant(slot) => {
                let actor = AutonomousActor::new(
                    signer,
                    self.cluster.clone(),
                    self.ledger.clone(),
                    self.config.ledger.clone(),
                    self.config.consensus.clone(),
                    self.initial_balances_snapshot(),
                );
                slot.insert(Arc::new(actor));
            }
        }
        if self.cluster.contains(&address) {
            self.cluster.set_role(&address, ObserverRole::Autonomous)?;
        }
        info!(actor = %address, "actor created");
        Ok(address)
    }

    pub fn delete_actor(&self, address: &Address) -> EcResult<()> {
        self.actors
            .remove(address)
            .ok_or_else(|| ConsensusError::UnknownActor(address.to_hex()))?;
        if self.cluster.contains(address) {
            self.cluster.set_role(address, ObserverRole::Passive)?;
        }
        info!(actor = %address, "actor deleted");
        Ok(())
    }

    pub fn actor(&self, address: &Address) -> Option<Arc<AutonomousActor>> {
        self.actors.get(address).map(|entry| entry.value().clone())
    }

    fn controlled(&self, address: &Address) -> EcResult<Arc<AutonomousActor>> {
        self.actor(address)
            .ok_or_else(|| ConsensusError::UnknownActor(address.to_hex()).into())
    }

    pub fn actors(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.actors.iter().map(|entry| *entry.key()).collect();
        addresses.sort_unstable();
        addresses
    }

    // -- trust --

    pub fn set_trust(&self, address: Address, trust: f64) -> EcResult<()> {
        self.cluster
            .set_trust(address, trust, self.config.consensus.resync_on_join)?;
        if trust > 0.0 && self.actors.contains_key(&address) {
            self.cluster.set_role(&address, ObserverRole::Autonomous)?;
        }
        Ok(())
    }

    pub fn roster(&self) -> Vec<RosterEntry> {
        self.cluster.roster()
    }

    /// Candidate histories an observer has marked, with its confidences.
    pub fn markers(&self, address: &Address) -> EcResult<BTreeMap<CandidateHistory, f64>> {
        self.cluster.marked_histories(address)
    }

    // -- voting --

    /// Tick the actor at `address`, optionally proposing a new candidate.
    ///
    /// A proposal proven not solid is refused with `InvalidHistory`; one that
    /// cannot be decided yet returns the retryable incomplete error.
    pub fn consider(&self, address: &Address, proposal: Option<CandidateHistory>) -> EcResult<TickReport> {
        let actor = self.controlled(address)?;
        if let Some(history) = proposal {
            if !actor.is_history_valid(&history)? {
                return Err(ConsensusError::InvalidHistory(history.id()).into());
            }
        }
        actor.tick(proposal.as_slice())
    }

    /// [`ConsensusEngine::consider`] with textual arguments. Two empty
    /// references mean a plain tick.
    pub fn consider_ids(&self, address: &str, first: &str, second: &str) -> EcResult<TickReport> {
        let address = Address::from_hex(address)?;
        let proposal = if first.is_empty() && second.is_empty() {
            None
        } else {
            Some(CandidateHistory::new(
                Reference::from_hex(first)?,
                Reference::from_hex(second)?,
            ))
        };
        self.consider(&address, proposal)
    }

    /// Tick every controlled actor in parallel.
    pub fn tick_all(&self) -> Vec<(Address, EcResult<TickReport>)> {
        let actors: Vec<Arc<AutonomousActor>> =
            self.actors.iter().map(|entry| entry.value().clone()).collect();
        actors
            .par_iter()
            .map(|actor| (actor.address(), actor.tick(&[])))
            .collect()
    }

    // -- balances --

    fn initial_balances_snapshot(&self) -> HashMap<Address, i128> {
        self.initial_balances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn initial_balance(&self, address: &Address) -> i128 {
        self.initial_balances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(address)
            .copied()
            .unwrap_or(0)
    }

    /// Shift the starting funds of `address` for the engine and every actor.
    pub fn change_initial_balance(&self, address: Address, delta: i128) {
        {
            let mut balances = self
                .initial_balances
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let entry = balances.entry(address).or_insert(0);
            *entry = entry.saturating_add(delta);
        }
        for actor in self.actors.iter() {
            actor.value().change_initial_balance(address, delta);
        }
        info!(address = %address, delta, "initial balance changed");
    }

    /// Initial balance plus every confirmed record on `address`.
    pub fn balance_of(&self, address: &Address) -> i128 {
        let confirmed: i128 = self
            .ledger
            .find_by_address(address)
            .iter()
            .filter(|tx| tx.value != 0 && self.is_confirmed(&tx.id))
            .map(|tx| i128::from(tx.value))
            .sum();
        self.initial_balance(address) + confirmed
    }

    // -- transfers --

    /// Build, sign, and broadcast a transfer. The head is watched and
    /// returned.
    #[instrument(skip(self, request), fields(receiver = %request.receiver, value = request.value))]
    pub fn send_transfer(&self, request: TransferRequest) -> EcResult<Reference> {
        let spender = address_of_key(&request.key);
        let available = if request.check_balance || request.remainder.is_some() {
            Some(self.balance_of(&spender))
        } else {
            None
        };
        if request.check_balance {
            let balance = available.unwrap_or(0);
            if balance < i128::from(request.value) {
                return Err(LedgerError::InsufficientBalance {
                    address: spender,
                    balance,
                    value: request.value,
                }
                .into());
            }
        }

        let mut builder = TransferBuilder::new().output(
            request.receiver,
            request.value,
            Tag::from_label(TRANSFER_TAG_LABEL),
        );
        let change = match (request.remainder, available) {
            (Some(remainder), Some(balance)) if balance > i128::from(request.value) => {
                let change = i64::try_from(balance - i128::from(request.value))
                    .map_err(|_| LedgerError::BalanceOverflow { address: spender })?;
                builder = builder.output(remainder, change, Tag::from_label(REMAINDER_TAG_LABEL));
                change
            }
            _ => 0,
        };
        let spent = request
            .value
            .checked_add(change)
            .ok_or(LedgerError::BalanceOverflow { address: spender })?;
        let records = builder
            .input(&request.key, spent)
            .tips(request.tips.0, request.tips.1)
            .build()?;

        let head = records
            .first()
            .map(|record| record.id)
            .ok_or_else(|| LedgerError::MalformedTransfer {
                head: Reference::GENESIS,
                reason: "transfer has no records".to_string(),
            })?;
        for record in records.into_iter().rev() {
            self.ledger.broadcast(record)?;
        }
        self.watch_transfer(head);
        info!(head = %head, spender = %spender, change, "transfer sent");
        Ok(head)
    }

    pub fn watch_transfer(&self, head: Reference) {
        self.watched
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(head);
    }

    pub fn unwatch_transfer(&self, head: &Reference) -> bool {
        self.watched
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(head)
    }

    pub fn watched_transfers(&self) -> Vec<Reference> {
        self.watched
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }

    // -- persistence --

    pub fn snapshot(&self) -> PersistedState {
        PersistedState::new(self.roster(), self.watched_transfers())
    }

    /// Re-apply a saved roster and watch list on top of the current state.
    pub fn restore(&self, state: &PersistedState) -> EcResult<()> {
        for entry in &state.trusted {
            self.set_trust(entry.address, entry.trust)?;
        }
        for head in &state.transfers {
            self.watch_transfer(*head);
        }
        info!(
            trusted = state.trusted.len(),
            transfers = state.transfers.len(),
            "state restored"
        );
        Ok(())
    }

    pub fn save(&self) -> EcResult<()> {
        self.snapshot().store(&self.config.persistence.path)
    }

    pub fn load(&self) -> EcResult<()> {
        let state = PersistedState::load(&self.config.persistence.path)?;
        self.restore(&state)
    }
}
