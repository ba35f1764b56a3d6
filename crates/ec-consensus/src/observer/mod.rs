//! Observers: one per trust source.
//!
//! An observer ingests the markers its trust source issues and keeps one
//! [`SubTangle`] per candidate history it has heard about, ordered by
//! descending confidence.

mod sub_tangle;

pub use sub_tangle::SubTangle;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use ec_core::errors::{ConsensusError, EcResult};
use ec_core::models::{Address, CandidateHistory, Reference, Transaction};
use ec_core::traits::LedgerLink;
use ec_ledger::{verify_marker, MarkerAttestation};

/// Whether the trust source votes on its own through this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObserverRole {
    /// Markers come from elsewhere; this node only listens.
    #[default]
    Passive,
    /// An actor controlled by this node publishes the markers.
    Autonomous,
}

/// A trust source and everything it has attested to.
#[derive(Debug, Clone)]
pub struct Observer {
    address: Address,
    trust: f64,
    role: ObserverRole,
    sub_tangles: Vec<SubTangle>,
    next_seq: u64,
}

pub(crate) fn validate_trust(trust: f64) -> EcResult<f64> {
    if trust.is_finite() && (0.0..=1.0).contains(&trust) {
        Ok(trust)
    } else {
        Err(ConsensusError::InvalidTrust(trust).into())
    }
}

impl Observer {
    pub fn new(address: Address, trust: f64) -> EcResult<Self> {
        Ok(Self {
            address,
            trust: validate_trust(trust)?,
            role: ObserverRole::Passive,
            sub_tangles: Vec::new(),
            next_seq: 0,
        })
    }

    pub fn with_role(mut self, role: ObserverRole) -> Self {
        self.role = role;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn trust(&self) -> f64 {
        self.trust
    }

    pub fn set_trust(&mut self, trust: f64) -> EcResult<()> {
        self.trust = validate_trust(trust)?;
        Ok(())
    }

    pub fn role(&self) -> ObserverRole {
        self.role
    }

    pub fn set_role(&mut self, role: ObserverRole) {
        self.role = role;
    }

    /// Sub-tangles in descending confidence order.
    pub fn sub_tangles(&self) -> &[SubTangle] {
        &self.sub_tangles
    }

    pub fn sub_tangle(&self, history: &CandidateHistory) -> Option<&SubTangle> {
        self.sub_tangles.iter().find(|s| s.history() == *history)
    }

    /// Accept a marker issued by this observer's address.
    ///
    /// Rejects markers that do not verify and markers whose index is not
    /// above the last one accepted for the same history. Nothing changes on
    /// rejection.
    #[instrument(skip(self, marker, ledger), fields(observer = %self.address, marker = %marker.id))]
    pub fn ingest_marker(
        &mut self,
        marker: &Transaction,
        ledger: &dyn LedgerLink,
    ) -> EcResult<MarkerAttestation> {
        let attestation = verify_marker(marker, &self.address)?;
        let MarkerAttestation {
            history,
            index,
            confidence,
        } = attestation;

        match self.sub_tangles.iter_mut().find(|s| s.history() == history) {
            Some(sub_tangle) => {
                if sub_tangle.last_index() >= index {
                    warn!(
                        history = %history,
                        index,
                        last_index = sub_tangle.last_index(),
                        "marker replay rejected"
                    );
                    return Err(ConsensusError::MarkerReplay {
                        index,
                        last_index: sub_tangle.last_index(),
                    }
                    .into());
                }
                sub_tangle.update(index, confidence);
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.sub_tangles
                    .push(SubTangle::new(history, index, confidence, seq, ledger));
            }
        }
        self.sub_tangles.sort_by(|a, b| {
            b.confidence()
                .total_cmp(&a.confidence())
                .then_with(|| a.seq().cmp(&b.seq()))
        });
        debug!(history = %history, index, confidence, "marker accepted");
        Ok(attestation)
    }

    /// Widen every sub-tangle that was waiting for `transaction`. Returns
    /// how many were widened.
    pub fn ingest_transaction(&mut self, transaction: &Transaction, ledger: &dyn LedgerLink) -> usize {
        self.sub_tangles
            .iter_mut()
            .map(|s| s.on_transaction(transaction, ledger))
            .filter(|widened| *widened)
            .count()
    }

    /// Confidence of the most confident history covering `reference`, or 0.
    pub fn confidence_of(&self, reference: &Reference) -> f64 {
        self.sub_tangles
            .iter()
            .find(|s| s.covers(reference))
            .map_or(0.0, SubTangle::confidence)
    }

    pub fn marked_histories(&self) -> BTreeMap<CandidateHistory, f64> {
        self.sub_tangles
            .iter()
            .map(|s| (s.history(), s.confidence()))
            .collect()
    }

    pub fn histories(&self) -> impl Iterator<Item = CandidateHistory> + '_ {
        self.sub_tangles.iter().map(SubTangle::history)
    }
}
