//! Shared test scaffolding: deterministic keys, funded ledgers, and JSON
//! fixture loading.

mod scenario;

pub use scenario::LedgerScenario;

use std::path::PathBuf;
use std::sync::Arc;

use ed25519_dalek::SigningKey;
use serde::de::DeserializeOwned;

use ec_core::models::{Address, CandidateHistory, Reference, Tag, Transaction};
use ec_ledger::{address_of_key, Ed25519Signer};

/// Directory holding the JSON fixtures.
fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Get the absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// Deterministic signing key derived from one byte.
pub fn key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

/// Address of [`key`]`(seed)`.
pub fn address(seed: u8) -> Address {
    address_of_key(&key(seed))
}

/// Deterministic marker signer for [`key`]`(seed)`.
pub fn signer(seed: u8) -> Arc<Ed25519Signer> {
    Arc::new(Ed25519Signer::from_seed([seed; 32]))
}

/// The candidate history made of a single reference.
pub fn single(reference: Reference) -> CandidateHistory {
    CandidateHistory::new(reference, reference)
}

/// A sealed zero-value record carrying `label`.
pub fn data_record(label: &str, parent1: Reference, parent2: Reference) -> Transaction {
    Transaction {
        id: Reference::GENESIS,
        address: Address::from_bytes([0xdd; 32]),
        value: 0,
        parent1,
        parent2,
        tag: Tag::from_label(label),
        is_atomic_head: false,
        is_atomic_tail: false,
        signature: None,
    }
    .seal()
}
