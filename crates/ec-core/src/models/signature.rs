//! Index-carrying signatures.
//!
//! Every signature commits to its issuance index: the signed message is
//! `index (big endian) || payload`. Observers use the authenticated index to
//! reject replayed or rolled-back markers.

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};

use super::reference::Address;

/// A signature together with the one-time index it was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Issuance index. Never reused by an honest signer.
    pub index: u32,
    /// Ed25519 signature over [`Signature::signing_message`].
    pub bytes: ed25519_dalek::Signature,
}

impl Signature {
    /// The exact bytes signed for `payload` under `index`.
    pub fn signing_message(index: u32, payload: &[u8]) -> Vec<u8> {
        let mut message = Vec::with_capacity(4 + payload.len());
        message.extend_from_slice(&index.to_be_bytes());
        message.extend_from_slice(payload);
        message
    }

    /// Verify against the claimed address. Malformed addresses never verify.
    pub fn verify(&self, address: &Address, payload: &[u8]) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(address.as_bytes()) else {
            return false;
        };
        key.verify_strict(&Self::signing_message(self.index, payload), &self.bytes)
            .is_ok()
    }

    /// Bytes folded into a record's content hash.
    pub fn to_hash_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(4 + ed25519_dalek::SIGNATURE_LENGTH);
        bytes.extend_from_slice(&self.index.to_be_bytes());
        bytes.extend_from_slice(&self.bytes.to_bytes());
        bytes
    }
}
