//! Collaborator seams. The ledger/broadcast layer and the signer are external
//! to the engine; these traits are the only contact surface.

pub mod ledger;
pub mod signer;

pub use ledger::{LedgerLink, LedgerListener};
pub use signer::MarkerSigner;
