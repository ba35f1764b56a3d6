//! Sequential voting state of one actor.

use std::collections::{HashMap, HashSet};

use ec_core::models::CandidateHistory;

/// Where a tick currently is. Always back to `Idle` when a tick returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPhase {
    #[default]
    Idle,
    Estimating,
    Publishing,
}

#[derive(Debug)]
pub(crate) struct VotingState {
    pub(crate) phase: TickPhase,
    pub(crate) aggressivity: f64,
    /// Candidates proven solid under the current initial balances.
    pub(crate) valid: HashSet<CandidateHistory>,
    /// Candidates proven not solid under the current initial balances.
    pub(crate) invalid: HashSet<CandidateHistory>,
    /// Last confidence published per candidate.
    pub(crate) published: HashMap<CandidateHistory, f64>,
    /// Previous round's top pick.
    pub(crate) leading: Option<CandidateHistory>,
}

impl VotingState {
    pub(crate) fn new(aggressivity: f64) -> Self {
        Self {
            phase: TickPhase::Idle,
            aggressivity,
            valid: HashSet::new(),
            invalid: HashSet::new(),
            published: HashMap::new(),
            leading: None,
        }
    }

    pub(crate) fn forget_verdicts(&mut self) {
        self.valid.clear();
        self.invalid.clear();
    }
}
