//! Ed25519 one-time-index signer.

use std::sync::{Mutex, PoisonError};

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use tracing::warn;

use ec_core::errors::{EcResult, SigningError};
use ec_core::models::{Address, Signature};
use ec_core::traits::MarkerSigner;

use crate::transfer::address_of_key;

/// Signs with a single Ed25519 key, binding every signature to an index that
/// is never handed out twice.
///
/// Indices only move forward. Signing under an index below the next unused
/// one fails, which is what lets observers treat the index as a replay guard.
pub struct Ed25519Signer {
    key: SigningKey,
    next_index: Mutex<u32>,
    capacity: Option<u32>,
}

impl Ed25519Signer {
    /// A fresh key from the OS RNG.
    pub fn generate() -> Self {
        Self::from_key(SigningKey::generate(&mut OsRng))
    }

    /// A deterministic key derived from `seed`.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::from_key(SigningKey::from_bytes(&seed))
    }

    pub fn from_key(key: SigningKey) -> Self {
        Self {
            key,
            next_index: Mutex::new(0),
            capacity: None,
        }
    }

    /// Limit the number of indices this signer may issue.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Resume from a previously persisted index.
    pub fn starting_at(self, index: u32) -> Self {
        *self.next_index.lock().unwrap_or_else(PoisonError::into_inner) = index;
        self
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.key
    }

    /// The lowest index not used yet.
    pub fn next_index(&self) -> u32 {
        *self.next_index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sign_locked(&self, next: &mut u32, payload: &[u8], index: u32) -> EcResult<Signature> {
        if index < *next {
            warn!(index, next = *next, "refusing to reuse signature index");
            return Err(SigningError::IndexReused { index, next: *next }.into());
        }
        let capacity = self.capacity.unwrap_or(u32::MAX);
        if index >= capacity {
            return Err(SigningError::IndexExhausted { capacity }.into());
        }
        let bytes = self.key.sign(&Signature::signing_message(index, payload));
        *next = index + 1;
        Ok(Signature { index, bytes })
    }
}

impl MarkerSigner for Ed25519Signer {
    fn address(&self) -> Address {
        address_of_key(&self.key)
    }

    fn sign(&self, payload: &[u8], index: u32) -> EcResult<Signature> {
        let mut next = self.next_index.lock().unwrap_or_else(PoisonError::into_inner);
        self.sign_locked(&mut next, payload, index)
    }

    fn sign_next(&self, payload: &[u8]) -> EcResult<Signature> {
        let mut next = self.next_index.lock().unwrap_or_else(PoisonError::into_inner);
        let index = *next;
        self.sign_locked(&mut next, payload, index)
    }
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("address", &self.address())
            .field("next_index", &self.next_index())
            .finish()
    }
}
