//! Conflict graph and confidence estimation.
//!
//! Candidates are nodes, conflicts are undirected edges. The estimator gives
//! each candidate its share of the weight in its closed neighbourhood:
//!
//! - isolated candidate: `1`
//! - otherwise: `w_i / (w_i + Σ_{j ∈ N(i)} w_j)`
//! - neighbourhood weighing nothing: `1 / (|N(i)| + 1)`
//!
//! Any group of mutually conflicting candidates lies inside each member's
//! closed neighbourhood, so its confidences sum to at most 1. A larger
//! initial guess never yields a smaller confidence.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{NodeIndex, UnGraph};

use ec_core::models::CandidateHistory;

/// Symmetric conflict relation over candidate histories.
#[derive(Debug, Clone, Default)]
pub struct ConflictGraph {
    graph: UnGraph<CandidateHistory, ()>,
    index: HashMap<CandidateHistory, NodeIndex>,
}

impl ConflictGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate if not present.
    pub fn add_candidate(&mut self, history: CandidateHistory) -> NodeIndex {
        if let Some(idx) = self.index.get(&history) {
            return *idx;
        }
        let idx = self.graph.add_node(history);
        self.index.insert(history, idx);
        idx
    }

    /// Record that `a` and `b` cannot both hold. Self-conflicts are ignored.
    pub fn add_conflict(&mut self, a: CandidateHistory, b: CandidateHistory) {
        if a == b {
            return;
        }
        let a = self.add_candidate(a);
        let b = self.add_candidate(b);
        if self.graph.find_edge(a, b).is_none() {
            self.graph.add_edge(a, b, ());
        }
    }

    pub fn conflicts(&self, a: &CandidateHistory, b: &CandidateHistory) -> bool {
        match (self.index.get(a), self.index.get(b)) {
            (Some(a), Some(b)) => self.graph.find_edge(*a, *b).is_some(),
            _ => false,
        }
    }

    pub fn neighbours(&self, history: &CandidateHistory) -> Vec<CandidateHistory> {
        let Some(idx) = self.index.get(history) else {
            return Vec::new();
        };
        self.graph
            .neighbors(*idx)
            .filter_map(|n| self.graph.node_weight(n).copied())
            .collect()
    }

    pub fn candidates(&self) -> impl Iterator<Item = CandidateHistory> + '_ {
        self.graph.node_weights().copied()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn conflict_count(&self) -> usize {
        self.graph.edge_count()
    }
}

/// Turns initial guesses into confidences consistent with the conflicts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceEstimator;

impl ConfidenceEstimator {
    pub fn new() -> Self {
        Self
    }

    /// Estimate a confidence for every candidate in `graph`. Missing, non-finite,
    /// or negative guesses count as 0.
    pub fn estimate(
        &self,
        graph: &ConflictGraph,
        guesses: &HashMap<CandidateHistory, f64>,
    ) -> BTreeMap<CandidateHistory, f64> {
        let weight = |idx: NodeIndex| -> f64 {
            graph
                .graph
                .node_weight(idx)
                .and_then(|h| guesses.get(h))
                .copied()
                .filter(|w| w.is_finite() && *w > 0.0)
                .unwrap_or(0.0)
        };

        graph
            .graph
            .node_indices()
            .map(|idx| {
                let own = weight(idx);
                let mut degree = 0usize;
                let mut around = 0.0;
                for n in graph.graph.neighbors(idx) {
                    degree += 1;
                    around += weight(n);
                }
                let confidence = if degree == 0 {
                    1.0
                } else if own + around > 0.0 {
                    own / (own + around)
                } else {
                    1.0 / (degree as f64 + 1.0)
                };
                (graph.graph[idx], confidence.clamp(0.0, 1.0))
            })
            .collect()
    }
}
