//! Candidate histories: the two branches a marker attests to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{HISTORY_ID_LENGTH, REFERENCE_HEX_LENGTH};
use crate::errors::{ConsensusError, EcError, EcResult};

use super::reference::Reference;

/// An unordered pair of references, stored in ascending order so that the
/// same pair always yields the same identifier. Represents the history
/// reachable from either reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateHistory {
    first: Reference,
    second: Reference,
}

impl CandidateHistory {
    /// Canonicalize a pair of references.
    pub fn new(a: Reference, b: Reference) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// The smaller reference.
    pub fn first(&self) -> Reference {
        self.first
    }

    /// The larger reference.
    pub fn second(&self) -> Reference {
        self.second
    }

    /// Both references.
    pub fn references(&self) -> [Reference; 2] {
        [self.first, self.second]
    }

    /// Stable textual identifier: both references in hex, concatenated.
    pub fn id(&self) -> String {
        format!("{}{}", self.first, self.second)
    }

    /// Parse a textual identifier. Any length other than two references is
    /// an input error.
    pub fn parse(id: &str) -> EcResult<Self> {
        if id.len() != HISTORY_ID_LENGTH || !id.is_ascii() {
            return Err(ConsensusError::MalformedHistory {
                value: id.to_string(),
                expected: HISTORY_ID_LENGTH,
                actual: id.len(),
            }
            .into());
        }
        let (a, b) = id.split_at(REFERENCE_HEX_LENGTH);
        Ok(Self::new(Reference::from_hex(a)?, Reference::from_hex(b)?))
    }
}

impl fmt::Display for CandidateHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.first, self.second)
    }
}

impl FromStr for CandidateHistory {
    type Err = EcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_does_not_matter() {
        let a = Reference::digest(b"a");
        let b = Reference::digest(b"b");
        assert_eq!(CandidateHistory::new(a, b), CandidateHistory::new(b, a));
        assert_eq!(CandidateHistory::new(a, b).id(), CandidateHistory::new(b, a).id());
    }

    #[test]
    fn id_round_trips() {
        let history = CandidateHistory::new(Reference::digest(b"x"), Reference::digest(b"y"));
        assert_eq!(CandidateHistory::parse(&history.id()).unwrap(), history);
    }

    #[test]
    fn short_id_is_malformed() {
        let err = CandidateHistory::parse(&"a".repeat(HISTORY_ID_LENGTH - 1)).unwrap_err();
        assert!(matches!(
            err,
            EcError::Consensus(ConsensusError::MalformedHistory { .. })
        ));
    }
}
