//! Configuration for the engine.
//! TOML-based, layered: compiled defaults < TOML file < `EC_*` environment.

pub mod consensus_config;
pub mod ec_config;
pub mod ledger_config;
pub mod persistence_config;

pub use consensus_config::ConsensusConfig;
pub use ec_config::EcConfig;
pub use ledger_config::LedgerConfig;
pub use persistence_config::PersistenceConfig;
