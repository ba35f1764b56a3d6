//! Ledger-level data model shared by every crate.

pub mod confidence;
pub mod history;
pub mod reference;
pub mod signature;
pub mod tag;
pub mod transaction;

pub use confidence::{decode_confidence, encode_confidence, Confidence};
pub use history::CandidateHistory;
pub use reference::{Address, Reference};
pub use signature::Signature;
pub use tag::Tag;
pub use transaction::Transaction;
