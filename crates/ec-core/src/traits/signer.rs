use crate::errors::EcResult;
use crate::models::{Address, Signature};

/// One-time-index signer. Each index signs at most one message.
pub trait MarkerSigner: Send + Sync {
    /// Address the signatures verify against.
    fn address(&self) -> Address;

    /// Address for a given index. Signers whose key does not depend on the
    /// index return [`MarkerSigner::address`].
    fn address_of(&self, index: u32) -> Address {
        let _ = index;
        self.address()
    }

    /// Sign `payload` under `index`. Must fail if `index` was already used.
    fn sign(&self, payload: &[u8], index: u32) -> EcResult<Signature>;

    /// Sign `payload` under the next unused index.
    fn sign_next(&self, payload: &[u8]) -> EcResult<Signature>;
}
