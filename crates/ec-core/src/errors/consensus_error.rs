/// Observer, cluster, and actor errors. All of them are input-contract
/// violations: they are raised before any state is mutated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsensusError {
    #[error("malformed candidate history '{value}': expected {expected} characters, got {actual}")]
    MalformedHistory {
        value: String,
        expected: usize,
        actual: usize,
    },

    #[error("no actor controlled by this node has address {0}")]
    UnknownActor(String),

    #[error("actor {0} is already controlled by this node")]
    ActorAlreadyControlled(String),

    #[error("observer {0} is already part of the cluster")]
    ObserverAlreadyRegistered(String),

    #[error("observer not found: {0}")]
    ObserverNotFound(String),

    #[error("trust must be within [0, 1], got {0}")]
    InvalidTrust(f64),

    #[error("aggressivity must be positive, got {0}")]
    InvalidAggressivity(f64),

    #[error("marker rejected: {reason}")]
    MarkerRejected { reason: String },

    #[error("marker replay: index {index} is not above last accepted index {last_index}")]
    MarkerReplay { index: u32, last_index: u32 },

    #[error("candidate history {0} is not solid")]
    InvalidHistory(String),

    #[error("tag does not encode a confidence: {0}")]
    InvalidTag(String),
}
