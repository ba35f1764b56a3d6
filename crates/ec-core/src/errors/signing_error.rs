/// One-time-index signer errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SigningError {
    #[error("signature index {index} already used (next unused index is {next})")]
    IndexReused { index: u32, next: u32 },

    #[error("signer exhausted: all {capacity} indices used")]
    IndexExhausted { capacity: u32 },

    #[error("malformed key: {0}")]
    MalformedKey(String),
}
