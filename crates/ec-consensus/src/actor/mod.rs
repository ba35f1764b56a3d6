//! Autonomous actors: observers that vote.
//!
//! Each tick gathers every candidate history the cluster knows plus any
//! proposed ones, drops those that are not solid, links the survivors that
//! cannot coexist, estimates a confidence for each, and publishes a marker
//! wherever the quantized confidence moved. Published values move only a
//! `1 / publish_damping` step towards the estimate per tick.

mod state;

pub use state::TickPhase;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, instrument, warn};

use ec_core::config::{ConsensusConfig, LedgerConfig};
use ec_core::errors::{ConsensusError, EcResult, LedgerError};
use ec_core::models::{encode_confidence, Address, CandidateHistory};
use ec_core::traits::{LedgerLink, MarkerSigner};
use ec_ledger::{build_marker, LedgerValidator};

use crate::cluster::Cluster;
use crate::estimator::{ConfidenceEstimator, ConflictGraph};

use self::state::VotingState;

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Solid candidates that took part in the vote.
    pub candidates: usize,
    /// Candidates proven not solid.
    pub discarded: usize,
    /// Candidates skipped because part of their history is not visible yet.
    pub pending: usize,
    pub conflicts: usize,
    pub estimates: BTreeMap<CandidateHistory, f64>,
    /// Markers broadcast this tick, with the published (damped) confidence.
    pub published: Vec<(CandidateHistory, f64)>,
    pub leading: Option<CandidateHistory>,
}

pub struct AutonomousActor {
    signer: Arc<dyn MarkerSigner>,
    cluster: Arc<Cluster>,
    ledger: Arc<dyn LedgerLink>,
    validator: LedgerValidator,
    estimator: ConfidenceEstimator,
    config: ConsensusConfig,
    state: Mutex<VotingState>,
}

impl AutonomousActor {
    pub fn new(
        signer: Arc<dyn MarkerSigner>,
        cluster: Arc<Cluster>,
        ledger: Arc<dyn LedgerLink>,
        ledger_config: LedgerConfig,
        config: ConsensusConfig,
        initial_balances: HashMap<Address, i128>,
    ) -> Self {
        let validator =
            LedgerValidator::with_initial_balances(ledger.clone(), ledger_config, initial_balances);
        Self {
            signer,
            cluster,
            ledger,
            validator,
            estimator: ConfidenceEstimator::new(),
            state: Mutex::new(VotingState::new(config.aggressivity)),
            config,
        }
    }

    fn state(&self) -> MutexGuard<'_, VotingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn validator(&self) -> &LedgerValidator {
        &self.validator
    }

    pub fn aggressivity(&self) -> f64 {
        self.state().aggressivity
    }

    pub fn set_aggressivity(&self, aggressivity: f64) -> EcResult<()> {
        if !(aggressivity.is_finite() && aggressivity > 0.0) {
            return Err(ConsensusError::InvalidAggressivity(aggressivity).into());
        }
        self.state().aggressivity = aggressivity;
        Ok(())
    }

    pub fn phase(&self) -> TickPhase {
        self.state().phase
    }

    pub fn leading(&self) -> Option<CandidateHistory> {
        self.state().leading
    }

    pub fn published_confidence(&self, history: &CandidateHistory) -> Option<f64> {
        self.state().published.get(history).copied()
    }

    pub fn published(&self) -> BTreeMap<CandidateHistory, f64> {
        self.state()
            .published
            .iter()
            .map(|(h, c)| (*h, *c))
            .collect()
    }

    /// Shift this actor's view of an address's starting funds. Every cached
    /// solidity verdict is dropped.
    pub fn change_initial_balance(&self, address: Address, delta: i128) {
        let mut state = self.state();
        self.validator.change_initial_balance(address, delta);
        state.forget_verdicts();
    }

    /// Solidity of `history` under this actor's balances. `Err` only when the
    /// history is not completely visible yet.
    pub fn is_history_valid(&self, history: &CandidateHistory) -> Result<bool, LedgerError> {
        let mut state = self.state();
        self.validity(&mut state, history)
    }

    fn validity(&self, state: &mut VotingState, history: &CandidateHistory) -> Result<bool, LedgerError> {
        if state.valid.contains(history) {
            return Ok(true);
        }
        if state.invalid.contains(history) {
            return Ok(false);
        }
        let solid = self.validator.is_candidate_solid(history)?;
        if solid {
            state.valid.insert(*history);
        } else {
            state.invalid.insert(*history);
        }
        Ok(solid)
    }

    /// Run one voting round. Ticks of the same actor never overlap.
    #[instrument(skip(self, proposed), fields(actor = %self.address(), proposed = proposed.len()))]
    pub fn tick(&self, proposed: &[CandidateHistory]) -> EcResult<TickReport> {
        let mut state = self.state();
        let result = self.run_tick(&mut state, proposed);
        state.phase = TickPhase::Idle;
        result
    }

    fn run_tick(&self, state: &mut VotingState, proposed: &[CandidateHistory]) -> EcResult<TickReport> {
        state.phase = TickPhase::Estimating;
        let mut report = TickReport::default();

        let mut candidates: BTreeSet<CandidateHistory> = self.cluster.all_known_histories();
        candidates.extend(proposed.iter().copied());

        let mut surviving = Vec::with_capacity(candidates.len());
        for history in candidates {
            match self.validity(state, &history) {
                Ok(true) => surviving.push(history),
                Ok(false) => report.discarded += 1,
                Err(error) => {
                    debug!(history = %history, error = %error, "candidate not yet decidable");
                    report.pending += 1;
                }
            }
        }
        report.candidates = surviving.len();
        if surviving.is_empty() {
            state.leading = None;
            debug!("no solid candidates this round");
            return Ok(report);
        }

        let graph = self.conflict_graph(&surviving);
        report.conflicts = graph.conflict_count();

        let bias = 1.0 + state.aggressivity;
        let guesses: HashMap<CandidateHistory, f64> = surviving
            .iter()
            .map(|history| {
                let [first, second] = history.references();
                let guess = self
                    .cluster
                    .approval_confidence(&first)
                    .min(self.cluster.approval_confidence(&second));
                let guess = if state.leading == Some(*history) { guess * bias } else { guess };
                (*history, guess)
            })
            .collect();

        let estimates = self.estimator.estimate(&graph, &guesses);
        let leading = estimates
            .iter()
            .fold(None::<(CandidateHistory, f64)>, |best, (history, confidence)| match best {
                Some((_, top)) if top >= *confidence => best,
                _ => Some((*history, *confidence)),
            })
            .map(|(history, _)| history);
        state.leading = leading;
        report.leading = leading;

        state.phase = TickPhase::Publishing;
        for (history, confidence) in &estimates {
            let previous = state.published.get(history).copied();
            if previous.is_some_and(|old| encode_confidence(old) == encode_confidence(*confidence)) {
                continue;
            }
            let old = previous.unwrap_or(0.0);
            let damped = old + (confidence - old) / self.config.publish_damping;
            let marker = build_marker(&*self.signer, history, damped)?;
            self.ledger.broadcast(marker)?;
            state.published.insert(*history, damped);
            info!(history = %history, estimate = confidence, published = damped, "marker published");
            report.published.push((*history, damped));
        }
        report.estimates = estimates;
        Ok(report)
    }

    fn conflict_graph(&self, surviving: &[CandidateHistory]) -> ConflictGraph {
        let mut graph = ConflictGraph::new();
        for (i, a) in surviving.iter().enumerate() {
            graph.add_candidate(*a);
            for b in &surviving[i + 1..] {
                match self.validator.are_histories_compatible(a, b) {
                    Ok(true) => {}
                    Ok(false) => {
                        debug!(a = %a, b = %b, "conflicting candidates");
                        graph.add_conflict(*a, *b);
                    }
                    Err(error) => {
                        warn!(a = %a, b = %b, error = %error, "compatibility undecided, assuming conflict");
                        graph.add_conflict(*a, *b);
                    }
                }
            }
        }
        graph
    }
}
