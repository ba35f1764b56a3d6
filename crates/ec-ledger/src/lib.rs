//! # ec-ledger
//!
//! Everything that judges or produces ledger records:
//!
//! - [`validator`]: recursive structural and financial validation of candidate histories
//! - [`transfer`]: atomic-transfer structure, essence hashing, and construction
//! - [`marker`]: building and verifying signed confidence markers
//! - [`signing`]: Ed25519 one-time-index signer
//! - [`memory`]: concurrent in-memory ledger collaborator

pub mod marker;
pub mod memory;
pub mod signing;
pub mod transfer;
pub mod validator;

pub use marker::{build_marker, marker_payload, verify_marker, MarkerAttestation};
pub use memory::MemoryLedger;
pub use signing::Ed25519Signer;
pub use transfer::{address_of_key, collect_transfer, transfer_essence, TransferBuilder};
pub use validator::LedgerValidator;
