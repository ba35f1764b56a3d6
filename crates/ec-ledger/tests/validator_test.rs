//! LedgerValidator tests: completeness, transfer integrity, balances, and
//! memoization across partial ledger views.

use std::collections::HashMap;
use std::sync::Arc;

use ed25519_dalek::SigningKey;

use ec_core::config::LedgerConfig;
use ec_core::errors::LedgerError;
use ec_core::models::{Address, CandidateHistory, Reference, Tag, Transaction};
use ec_core::tracing_setup::init_tracing_with_filter;
use ec_ledger::validator::Verdict;
use ec_ledger::{address_of_key, LedgerValidator, MemoryLedger, TransferBuilder};

fn key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

fn receiver(seed: u8) -> Address {
    Address::from_bytes([seed; 32])
}

fn data_record(label: &str, parent1: Reference, parent2: Reference) -> Transaction {
    Transaction {
        id: Reference::GENESIS,
        address: receiver(0xdd),
        value: 0,
        parent1,
        parent2,
        tag: Tag::from_label(label),
        is_atomic_head: false,
        is_atomic_tail: false,
        signature: None,
    }
    .seal()
}

fn pay(from: &SigningKey, to: Address, amount: i64, tips: (Reference, Reference)) -> Vec<Transaction> {
    TransferBuilder::new()
        .input(from, amount)
        .output(to, amount, Tag::EMPTY)
        .tips(tips.0, tips.1)
        .build()
        .unwrap()
}

fn setup(funded: &[(Address, i128)]) -> (Arc<MemoryLedger>, LedgerValidator) {
    init_tracing_with_filter("ec_ledger=debug");
    let ledger = Arc::new(MemoryLedger::new());
    let validator = LedgerValidator::with_initial_balances(
        ledger.clone(),
        LedgerConfig::default(),
        funded.iter().copied().collect(),
    );
    (ledger, validator)
}

const GENESIS_TIPS: (Reference, Reference) = (Reference::GENESIS, Reference::GENESIS);

#[test]
fn genesis_history_is_solid() {
    let (_ledger, validator) = setup(&[]);
    let genesis = CandidateHistory::new(Reference::GENESIS, Reference::GENESIS);
    assert_eq!(validator.is_candidate_solid(&genesis), Ok(true));
}

#[test]
fn funded_transfer_is_solid_and_moves_balance() {
    let spender = key(1);
    let (ledger, validator) = setup(&[(address_of_key(&spender), 100)]);
    let transfer = pay(&spender, receiver(2), 40, GENESIS_TIPS);
    let head = transfer[0].id;
    ledger.store_all(transfer);

    assert_eq!(validator.is_history_solid(&[head]), Ok(true));
    let balances = validator.balances(&[head]).unwrap();
    assert_eq!(balances[&address_of_key(&spender)], 60);
    assert_eq!(balances[&receiver(2)], 40);
    assert_eq!(validator.verdict(&head), Some(Verdict::Valid));
}

#[test]
fn overdraft_is_a_negative_balance() {
    let spender = key(1);
    let (ledger, validator) = setup(&[(address_of_key(&spender), 100)]);
    let transfer = pay(&spender, receiver(2), 150, GENESIS_TIPS);
    let head = transfer[0].id;
    ledger.store_all(transfer);

    assert_eq!(validator.is_history_solid(&[head]), Ok(false));
    assert_eq!(
        validator.check_history(&[head]),
        Err(LedgerError::NegativeBalance {
            address: address_of_key(&spender),
            balance: -50,
        })
    );
    // Structure alone is fine.
    assert_eq!(validator.is_history_structurally_valid(&[head]), Ok(true));
}

#[test]
fn raising_initial_balance_clears_financial_verdicts() {
    let spender = key(1);
    let (ledger, validator) = setup(&[(address_of_key(&spender), 100)]);
    let transfer = pay(&spender, receiver(2), 150, GENESIS_TIPS);
    let head = transfer[0].id;
    ledger.store_all(transfer);

    assert_eq!(validator.is_history_solid(&[head]), Ok(false));
    validator.change_initial_balance(address_of_key(&spender), 50);
    assert_eq!(validator.is_history_solid(&[head]), Ok(true));
}

#[test]
fn missing_ancestor_is_retryable_and_named() {
    let spender = key(1);
    let (ledger, validator) = setup(&[(address_of_key(&spender), 100)]);
    let late = data_record("LATE", Reference::GENESIS, Reference::GENESIS);
    let transfer = pay(&spender, receiver(2), 10, (late.id, late.id));
    let head = transfer[0].id;
    ledger.store_all(transfer);

    let error = validator.check_history(&[head]).unwrap_err();
    assert!(error.is_retryable());
    assert_eq!(error.missing_reference(), Some(&late.id));
    assert_eq!(
        validator.verdict(&head),
        Some(Verdict::Unresolved { missing: late.id })
    );
    // Asking again without the record changes nothing.
    assert_eq!(
        validator.is_history_solid(&[head]),
        Err(LedgerError::IncompleteHistory { missing: late.id })
    );

    ledger.store(late.clone());
    assert_eq!(validator.is_history_solid(&[head]), Ok(true));
    assert_eq!(validator.verdict(&late.id), Some(Verdict::Valid));
}

#[test]
fn unbalanced_transfer_is_permanently_invalid() {
    let spender = key(1);
    let (ledger, validator) = setup(&[(address_of_key(&spender), 100)]);
    let transfer = TransferBuilder::new()
        .input(&spender, 10)
        .output(receiver(2), 9, Tag::EMPTY)
        .build()
        .unwrap();
    let head = transfer[0].id;
    ledger.store_all(transfer);

    let expected = LedgerError::InvalidTransferSum { head, sum: -1 };
    assert_eq!(validator.check_structure(head), Err(expected.clone()));
    assert_eq!(validator.verdict(&head), Some(Verdict::Invalid(expected.clone())));

    validator.change_initial_balance(address_of_key(&spender), 1_000);
    assert_eq!(validator.check_history(&[head]), Err(expected));
}

#[test]
fn input_signed_by_another_key_is_rejected() {
    let owner = key(1);
    let thief = key(9);
    let (ledger, validator) = setup(&[(address_of_key(&owner), 100)]);
    let mut transfer = pay(&thief, receiver(2), 50, GENESIS_TIPS);

    // Claim the owner's funds with the thief's signature.
    transfer[1].address = address_of_key(&owner);
    transfer[1] = transfer[1].clone().seal();
    transfer[0].parent1 = transfer[1].id;
    transfer[0] = transfer[0].clone().seal();
    let head = transfer[0].id;
    ledger.store_all(transfer);

    assert_eq!(
        validator.check_structure(head),
        Err(LedgerError::InvalidSignature { head })
    );
    assert_eq!(validator.is_history_solid(&[head]), Ok(false));
}

#[test]
fn record_not_matching_its_id_is_malformed() {
    let (ledger, validator) = setup(&[]);
    let mut record = data_record("HONEST", Reference::GENESIS, Reference::GENESIS);
    record.tag = Tag::from_label("FORGED");
    let reference = record.id;
    ledger.store(record);

    assert_eq!(
        validator.check_structure(reference),
        Err(LedgerError::MalformedRecord { reference })
    );
}

#[test]
fn overlong_transfer_is_malformed() {
    let spender = key(1);
    let ledger = Arc::new(MemoryLedger::new());
    let validator = LedgerValidator::with_initial_balances(
        ledger.clone(),
        LedgerConfig {
            max_transfer_records: 2,
        },
        HashMap::from([(address_of_key(&spender), 100)]),
    );
    let transfer = TransferBuilder::new()
        .input(&spender, 10)
        .output(receiver(2), 5, Tag::EMPTY)
        .output(receiver(3), 5, Tag::EMPTY)
        .build()
        .unwrap();
    let head = transfer[0].id;
    ledger.store_all(transfer);

    assert!(matches!(
        validator.check_structure(head),
        Err(LedgerError::MalformedTransfer { .. })
    ));
}

#[test]
fn double_spends_are_each_solid_but_incompatible() {
    let spender = key(1);
    let (ledger, validator) = setup(&[(address_of_key(&spender), 100)]);
    let first = pay(&spender, receiver(2), 80, GENESIS_TIPS);
    let second = pay(&spender, receiver(3), 80, GENESIS_TIPS);
    let a = CandidateHistory::new(first[0].id, first[0].id);
    let b = CandidateHistory::new(second[0].id, second[0].id);
    ledger.store_all(first);
    ledger.store_all(second);

    assert_eq!(validator.is_candidate_solid(&a), Ok(true));
    assert_eq!(validator.is_candidate_solid(&b), Ok(true));
    assert_eq!(validator.are_histories_compatible(&a, &b), Ok(false));
    assert_eq!(validator.are_histories_compatible(&a, &a), Ok(true));
}

#[test]
fn shared_ancestry_is_counted_once() {
    let spender = key(1);
    let (ledger, validator) = setup(&[(address_of_key(&spender), 100)]);
    let transfer = pay(&spender, receiver(2), 60, GENESIS_TIPS);
    let head = transfer[0].id;
    ledger.store_all(transfer);
    let left = data_record("LEFT", head, head);
    let right = data_record("RIGHT", head, Reference::GENESIS);
    ledger.store_all([left.clone(), right.clone()]);

    let balances = validator.balances(&[left.id, right.id]).unwrap();
    assert_eq!(balances[&address_of_key(&spender)], 40);
    assert_eq!(validator.is_history_solid(&[left.id, right.id]), Ok(true));
}

fn loose_value(owner: Address, value: i64, parent1: Reference) -> Transaction {
    Transaction {
        id: Reference::GENESIS,
        address: owner,
        value,
        parent1,
        parent2: Reference::GENESIS,
        tag: Tag::EMPTY,
        is_atomic_head: false,
        is_atomic_tail: false,
        signature: None,
    }
    .seal()
}

#[test]
fn value_outside_any_transfer_cannot_mint() {
    let (ledger, validator) = setup(&[]);
    let minted = loose_value(receiver(7), 1_000, Reference::GENESIS);
    let reference = minted.id;
    ledger.store(minted);

    assert_eq!(validator.is_history_structurally_valid(&[reference]), Ok(true));
    assert_eq!(
        validator.check_history(&[reference]),
        Err(LedgerError::OrphanValueRecord { reference })
    );
    assert_eq!(validator.is_history_solid(&[reference]), Ok(false));
}

#[test]
fn unsigned_debit_cannot_move_funds() {
    let victim = key(1);
    let (ledger, validator) = setup(&[(address_of_key(&victim), 100)]);
    let debit = loose_value(address_of_key(&victim), -100, Reference::GENESIS);
    let credit = loose_value(receiver(9), 100, debit.id);
    let (debit_ref, credit_ref) = (debit.id, credit.id);
    ledger.store_all([debit, credit]);

    assert_eq!(validator.is_history_solid(&[credit_ref]), Ok(false));
    match validator.balances(&[credit_ref]) {
        Err(LedgerError::OrphanValueRecord { reference }) => {
            assert!(reference == debit_ref || reference == credit_ref);
        }
        other => panic!("expected an orphan value record, got {other:?}"),
    }
}

#[test]
fn transfer_tail_without_its_head_is_rejected() {
    let spender = key(1);
    let (ledger, validator) = setup(&[(address_of_key(&spender), 100)]);
    let transfer = pay(&spender, receiver(2), 40, GENESIS_TIPS);
    let head = transfer[0].id;
    let tail = transfer.last().map(|record| record.id).unwrap();
    assert!(transfer.last().unwrap().is_atomic_tail);
    ledger.store_all(transfer);

    assert_eq!(
        validator.check_history(&[tail]),
        Err(LedgerError::OrphanValueRecord { reference: tail })
    );
    // Anchored at its head, the same transfer is solid.
    assert_eq!(validator.is_history_solid(&[head]), Ok(true));
    assert_eq!(validator.is_history_solid(&[head, tail]), Ok(true));
}
