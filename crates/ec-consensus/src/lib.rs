//! # ec-consensus
//!
//! Confidence bookkeeping and voting on top of `ec-ledger`:
//!
//! - [`observer`]: per-observer marker ingestion and sub-tangle bookkeeping
//! - [`cluster`]: trust-weighted roster and approval-confidence aggregation
//! - [`estimator`]: conflict graph and confidence estimation
//! - [`actor`]: autonomous voting actors and their tick state machine
//! - [`engine`]: the façade tying ledger, cluster, and actors together
//! - [`persistence`]: JSON roster and watched-transfer state

pub mod actor;
pub mod cluster;
pub mod engine;
pub mod estimator;
pub mod observer;
pub mod persistence;

pub use actor::{AutonomousActor, TickPhase, TickReport};
pub use cluster::{Cluster, RosterEntry};
pub use engine::{ConsensusEngine, TransferRequest};
pub use estimator::{ConfidenceEstimator, ConflictGraph};
pub use observer::{Observer, ObserverRole, SubTangle};
pub use persistence::PersistedState;
