//! Confidence markers.
//!
//! A marker is a single-record, zero-value transfer issued on the actor's
//! address. Its parents are the candidate history, its tag carries the
//! encoded confidence, and its signature covers both.

use tracing::debug;

use ec_core::errors::{ConsensusError, EcResult};
use ec_core::models::{
    decode_confidence, encode_confidence, Address, CandidateHistory, Tag, Transaction,
};
use ec_core::traits::MarkerSigner;

const MARKER_DOMAIN: &[u8] = b"ec-marker/v1";

/// What a verified marker attests to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerAttestation {
    pub history: CandidateHistory,
    pub index: u32,
    pub confidence: f64,
}

/// Bytes a marker signature covers.
pub fn marker_payload(history: &CandidateHistory, tag: &Tag) -> Vec<u8> {
    let mut payload = Vec::with_capacity(MARKER_DOMAIN.len() + 64 + tag.as_bytes().len());
    payload.extend_from_slice(MARKER_DOMAIN);
    payload.extend_from_slice(history.first().as_bytes());
    payload.extend_from_slice(history.second().as_bytes());
    payload.extend_from_slice(tag.as_bytes());
    payload
}

/// Build and seal a marker stating `confidence` in `history`, signed under
/// the signer's next unused index.
pub fn build_marker<S: MarkerSigner + ?Sized>(
    signer: &S,
    history: &CandidateHistory,
    confidence: f64,
) -> EcResult<Transaction> {
    let tag = encode_confidence(confidence);
    let signature = signer.sign_next(&marker_payload(history, &tag))?;
    let marker = Transaction {
        id: Default::default(),
        address: signer.address_of(signature.index),
        value: 0,
        parent1: history.first(),
        parent2: history.second(),
        tag,
        is_atomic_head: true,
        is_atomic_tail: true,
        signature: Some(signature),
    }
    .seal();
    debug!(
        history = %history,
        index = signature.index,
        confidence,
        marker = %marker.id,
        "marker built"
    );
    Ok(marker)
}

/// Check that `transaction` is a well-formed marker issued by `issuer` and
/// decode what it attests to.
pub fn verify_marker(transaction: &Transaction, issuer: &Address) -> EcResult<MarkerAttestation> {
    if transaction.address != *issuer {
        return Err(rejected("issued on another address"));
    }
    if !transaction.is_zero_value_single() {
        return Err(rejected("not a single-record zero-value transfer"));
    }
    if !transaction.is_sealed() {
        return Err(rejected("id does not match content"));
    }
    let signature = transaction
        .signature
        .ok_or_else(|| rejected("unsigned"))?;
    let history = CandidateHistory::new(transaction.parent1, transaction.parent2);
    if !signature.verify(issuer, &marker_payload(&history, &transaction.tag)) {
        return Err(rejected("signature does not verify"));
    }
    let confidence = decode_confidence(&transaction.tag)?;
    Ok(MarkerAttestation {
        history,
        index: signature.index,
        confidence,
    })
}

fn rejected(reason: &str) -> ec_core::EcError {
    ConsensusError::MarkerRejected {
        reason: reason.to_string(),
    }
    .into()
}
