//! Persistence tests: JSON state files and engine save/load.

use std::collections::BTreeSet;
use std::sync::Arc;

use ec_consensus::{ConsensusEngine, PersistedState, RosterEntry};
use ec_core::config::EcConfig;
use ec_core::models::{Address, Reference};
use ec_core::traits::MarkerSigner;
use ec_ledger::MemoryLedger;
use test_fixtures::{fixture_path, load_fixture, signer};

#[test]
fn missing_file_is_an_empty_state() {
    let dir = tempfile::tempdir().unwrap();
    let state = PersistedState::load(&dir.path().join("absent.json")).unwrap();
    assert!(state.trusted.is_empty());
    assert!(state.transfers.is_empty());
}

#[test]
fn state_round_trips_through_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let state = PersistedState::new(
        vec![RosterEntry {
            address: Address::from_bytes([5; 32]),
            trust: 0.25,
            role: Default::default(),
        }],
        vec![Reference::digest(b"watched")],
    );

    state.store(&path).unwrap();
    assert_eq!(PersistedState::load(&path).unwrap(), state);
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(PersistedState::load(&path).is_err());
}

#[test]
fn fixture_state_restores_the_roster() {
    let state: PersistedState = load_fixture("persisted_state.json");
    assert_eq!(state.trusted.len(), 2);

    let engine = ConsensusEngine::new(Arc::new(MemoryLedger::new()), EcConfig::default());
    engine.restore(&state).unwrap();
    let trusts: Vec<f64> = engine.roster().iter().map(|e| e.trust).collect();
    assert_eq!(trusts, vec![0.4, 0.6]);
    assert_eq!(engine.watched_transfers(), state.transfers);
    assert_eq!(
        PersistedState::load(&fixture_path("persisted_state.json")).unwrap(),
        state
    );
}

#[test]
fn engine_save_and_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = EcConfig::default();
    config.persistence.path = dir.path().join("engine.json");

    let engine = ConsensusEngine::new(Arc::new(MemoryLedger::new()), config.clone());
    engine.set_trust(signer(1).address(), 0.4).unwrap();
    engine.set_trust(signer(2).address(), 0.6).unwrap();
    engine.watch_transfer(Reference::digest(b"t"));
    engine.save().unwrap();

    let reloaded = ConsensusEngine::new(Arc::new(MemoryLedger::new()), config);
    reloaded.load().unwrap();
    assert_eq!(reloaded.roster(), engine.roster());
    let watched: BTreeSet<_> = reloaded.watched_transfers().into_iter().collect();
    assert!(watched.contains(&Reference::digest(b"t")));
}
