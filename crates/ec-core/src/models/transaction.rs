//! Immutable ledger records.

use serde::{Deserialize, Serialize};

use super::reference::{Address, Reference};
use super::signature::Signature;
use super::tag::Tag;

/// A ledger record. Created once, never mutated, referenced by id.
///
/// Records form a DAG through `parent1`/`parent2`. Inside an atomic transfer
/// the head links to the tail through `parent1`; the tail's parents and every
/// record's `parent2` point outside the transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Reference,
    pub address: Address,
    /// Zero for records that move no funds.
    pub value: i64,
    pub parent1: Reference,
    pub parent2: Reference,
    pub tag: Tag,
    pub is_atomic_head: bool,
    pub is_atomic_tail: bool,
    /// Present on transfer inputs and on markers.
    pub signature: Option<Signature>,
}

impl Transaction {
    /// Content hash over every field except the id itself.
    pub fn compute_id(&self) -> Reference {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.address.as_bytes());
        hasher.update(&self.value.to_be_bytes());
        hasher.update(self.parent1.as_bytes());
        hasher.update(self.parent2.as_bytes());
        hasher.update(self.tag.as_bytes());
        hasher.update(&[u8::from(self.is_atomic_head), u8::from(self.is_atomic_tail)]);
        match &self.signature {
            Some(signature) => {
                hasher.update(&[1]);
                hasher.update(&signature.to_hash_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        Reference::from_bytes(*hasher.finalize().as_bytes())
    }

    /// Set the id from the content hash.
    pub fn seal(mut self) -> Self {
        self.id = self.compute_id();
        self
    }

    /// Whether the stored id matches the content.
    pub fn is_sealed(&self) -> bool {
        self.id == self.compute_id()
    }

    /// Both parents, `parent1` first.
    pub fn parents(&self) -> [Reference; 2] {
        [self.parent1, self.parent2]
    }

    /// A single-record transfer moving no value: the shape of a marker, and
    /// exempt from transfer validation.
    pub fn is_zero_value_single(&self) -> bool {
        self.is_atomic_head && self.is_atomic_tail && self.value == 0
    }
}
