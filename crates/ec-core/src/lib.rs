//! # ec-core
//!
//! Foundation crate for the economic-cluster confidence engine.
//! Defines the ledger models, collaborator traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.
//!
//! Logging goes through `tracing`; call [`tracing_setup::init_tracing`] once
//! at startup to install a subscriber filtered by `EC_LOG`.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;
pub mod tracing_setup;

// Re-export the most commonly used types at the crate root.
pub use config::EcConfig;
pub use errors::{EcError, EcResult};
pub use models::{
    Address, CandidateHistory, Confidence, Reference, Signature, Tag, Transaction,
};
