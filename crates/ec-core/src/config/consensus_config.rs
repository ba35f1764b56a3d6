//! Configuration for observers, the cluster, and autonomous actors.
//!
//! # Examples
//!
//! ```
//! use ec_core::config::ConsensusConfig;
//!
//! let config = ConsensusConfig::default();
//! assert!((config.aggressivity - 1.1).abs() < f64::EPSILON);
//! assert!((config.publish_damping - 20.0).abs() < f64::EPSILON);
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_AGGRESSIVITY, DEFAULT_CONFIRMATION_CONFIDENCE, DEFAULT_PUBLISH_DAMPING,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Bias `1 + aggressivity` applied to last round's leading candidate. Default: 1.1.
    pub aggressivity: f64,
    /// Published confidence moves `1 / publish_damping` of the way per marker. Default: 20.
    pub publish_damping: f64,
    /// Approval confidence above which a record counts as confirmed. Default: 0.95.
    pub confirmation_confidence: f64,
    /// Replay existing markers when an observer joins the cluster. Default: true.
    pub resync_on_join: bool,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            aggressivity: DEFAULT_AGGRESSIVITY,
            publish_damping: DEFAULT_PUBLISH_DAMPING,
            confirmation_confidence: DEFAULT_CONFIRMATION_CONFIDENCE,
            resync_on_join: true,
        }
    }
}
