//! Cluster tests: trust-weighted aggregation, roster management, event
//! routing, and resync of late joiners.

use std::sync::{Arc, Barrier};
use std::thread;

use proptest::prelude::*;

use ec_consensus::{Cluster, Observer, ObserverRole, RosterEntry};
use ec_core::errors::ConsensusError;
use ec_core::models::Reference;
use ec_core::traits::{LedgerLink, LedgerListener, MarkerSigner};
use ec_core::EcError;
use ec_ledger::{build_marker, MemoryLedger};
use test_fixtures::{address, signer, single, LedgerScenario};

fn subscribed_cluster(ledger: &Arc<MemoryLedger>) -> Arc<Cluster> {
    let cluster = Arc::new(Cluster::new(ledger.clone()));
    let listener: Arc<dyn LedgerListener> = cluster.clone();
    ledger.subscribe(Arc::downgrade(&listener));
    cluster
}

#[test]
fn independent_transfers_are_weighted_by_trust() {
    let scenario = LedgerScenario::new().fund(1, 100);
    let t1 = scenario.pay(1, address(2), 10);
    let t2 = scenario.pay(1, address(3), 20);
    let cluster = subscribed_cluster(&scenario.ledger);

    let (actor, x, y) = (signer(10), signer(11), signer(12));
    cluster.set_trust(actor.address(), 0.5, true).unwrap();
    cluster.set_trust(x.address(), 0.3, true).unwrap();
    cluster.set_trust(y.address(), 0.2, true).unwrap();

    scenario
        .ledger
        .broadcast(build_marker(&*x, &single(t1), 0.05).unwrap())
        .unwrap();
    scenario
        .ledger
        .broadcast(build_marker(&*y, &single(t2), 0.07).unwrap())
        .unwrap();

    assert!((cluster.approval_confidence(&t1) - 0.015).abs() < 1e-9);
    assert!((cluster.approval_confidence(&t2) - 0.014).abs() < 1e-9);
    assert_eq!(cluster.all_known_histories().len(), 2);
}

#[test]
fn empty_cluster_approves_nothing() {
    let ledger = Arc::new(MemoryLedger::new());
    let cluster = Cluster::new(ledger);
    assert_eq!(cluster.approval_confidence(&Reference::digest(b"x")), 0.0);
    assert!(cluster.is_empty());
}

#[test]
fn roster_rejects_invalid_changes() {
    let ledger = Arc::new(MemoryLedger::new());
    let cluster = Cluster::new(ledger);
    let a = signer(1).address();

    cluster
        .add_observer(Observer::new(a, 0.5).unwrap(), false)
        .unwrap();
    let error = cluster
        .add_observer(Observer::new(a, 0.2).unwrap(), false)
        .unwrap_err();
    assert!(matches!(
        error,
        EcError::Consensus(ConsensusError::ObserverAlreadyRegistered(_))
    ));

    let b = signer(2).address();
    let error = cluster
        .add_observer(Observer::new(b, 0.0).unwrap(), false)
        .unwrap_err();
    assert!(matches!(error, EcError::Consensus(ConsensusError::InvalidTrust(_))));

    let error = cluster.remove_observer(&b).unwrap_err();
    assert!(matches!(error, EcError::Consensus(ConsensusError::ObserverNotFound(_))));

    assert!(cluster.set_trust(a, 1.5, false).is_err());
    assert_eq!(cluster.trust_of(&a), Some(0.5));
}

#[test]
fn zero_trust_removes_and_positive_trust_updates() {
    let ledger = Arc::new(MemoryLedger::new());
    let cluster = Cluster::new(ledger);
    let a = signer(1).address();

    cluster.set_trust(a, 0.5, false).unwrap();
    cluster.set_trust(a, 0.8, false).unwrap();
    assert_eq!(cluster.trust_of(&a), Some(0.8));
    cluster.set_trust(a, 0.0, false).unwrap();
    assert!(!cluster.contains(&a));
    // Removing an absent observer through trust 0 is a no-op.
    cluster.set_trust(a, 0.0, false).unwrap();
}

#[test]
fn late_joiner_recovers_markers_from_the_ledger() {
    let scenario = LedgerScenario::new().fund(1, 100);
    let t = scenario.pay(1, address(2), 10);
    let cluster = subscribed_cluster(&scenario.ledger);
    let issuer = signer(11);

    // Published before anyone trusted the issuer.
    for confidence in [0.1, 0.2, 0.3] {
        scenario
            .ledger
            .broadcast(build_marker(&*issuer, &single(t), confidence).unwrap())
            .unwrap();
    }
    assert_eq!(cluster.approval_confidence(&t), 0.0);

    cluster.set_trust(issuer.address(), 1.0, true).unwrap();
    assert!((cluster.approval_confidence(&t) - 0.3).abs() < 1e-9);
    let marked = cluster.marked_histories(&issuer.address()).unwrap();
    assert!((marked[&single(t)] - 0.3).abs() < 1e-9);
}

#[test]
fn joiner_without_resync_starts_blind() {
    let scenario = LedgerScenario::new().fund(1, 100);
    let t = scenario.pay(1, address(2), 10);
    let cluster = subscribed_cluster(&scenario.ledger);
    let issuer = signer(11);
    scenario
        .ledger
        .broadcast(build_marker(&*issuer, &single(t), 0.4).unwrap())
        .unwrap();

    cluster.set_trust(issuer.address(), 1.0, false).unwrap();
    assert_eq!(cluster.approval_confidence(&t), 0.0);
}

#[test]
fn roster_round_trips_through_restore() {
    let ledger = Arc::new(MemoryLedger::new());
    let cluster = Cluster::new(ledger.clone());
    cluster.set_trust(signer(1).address(), 0.4, false).unwrap();
    cluster.set_trust(signer(2).address(), 0.6, false).unwrap();
    cluster
        .set_role(&signer(2).address(), ObserverRole::Autonomous)
        .unwrap();
    let roster = cluster.roster();

    let restored = Cluster::new(ledger);
    restored.restore_roster(&roster, false).unwrap();
    assert_eq!(restored.roster(), roster);
    assert_eq!(
        roster[1],
        RosterEntry {
            address: signer(2).address(),
            trust: 0.6,
            role: ObserverRole::Autonomous,
        }
    );
}

proptest! {
    #[test]
    fn approval_is_a_trust_weighted_average(
        members in prop::collection::vec((0.01f64..=1.0, 0.0f64..=1.0), 1..6)
    ) {
        let scenario = LedgerScenario::new().fund(1, 100);
        let t = scenario.pay(1, address(2), 10);
        let cluster = subscribed_cluster(&scenario.ledger);

        let mut weighted = 0.0;
        let mut total = 0.0;
        for (i, (trust, confidence)) in members.iter().enumerate() {
            let issuer = signer(100 + i as u8);
            cluster.set_trust(issuer.address(), *trust, false).unwrap();
            let marker = build_marker(&*issuer, &single(t), *confidence).unwrap();
            scenario.ledger.broadcast(marker).unwrap();
            weighted += trust * (confidence * 1e6).round() / 1e6;
            total += trust;
        }

        let approval = cluster.approval_confidence(&t);
        prop_assert!((0.0..=1.0).contains(&approval));
        prop_assert!((approval - weighted / total).abs() < 1e-9);
    }
}

#[test]
fn marker_broadcast_while_observer_joins_is_not_lost() {
    for round in 0..50u8 {
        let scenario = LedgerScenario::new().fund(1, 100);
        let transfer = scenario.pay(1, address(2), 10);
        let cluster = subscribed_cluster(&scenario.ledger);
        let joiner = signer(20);
        let history = single(transfer);
        let marker = build_marker(&*joiner, &history, 0.25).unwrap();
        let barrier = Barrier::new(2);

        thread::scope(|s| {
            s.spawn(|| {
                barrier.wait();
                cluster.set_trust(joiner.address(), 0.5, true).unwrap();
            });
            s.spawn(|| {
                barrier.wait();
                scenario.ledger.broadcast(marker.clone()).unwrap();
            });
        });

        let marked = cluster.marked_histories(&joiner.address()).unwrap();
        assert_eq!(
            marked.get(&history).copied(),
            Some(0.25),
            "marker lost in round {round}"
        );
    }
}
