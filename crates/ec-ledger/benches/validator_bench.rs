//! Criterion benchmarks for ec-ledger validation.
//!
//! - cold validation of a 200-transfer chain
//! - warm re-validation of the same chain (memo hits)

use std::collections::HashMap;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use ed25519_dalek::SigningKey;

use ec_core::config::LedgerConfig;
use ec_core::models::{Address, Reference, Tag};
use ec_ledger::{address_of_key, LedgerValidator, MemoryLedger, TransferBuilder};

fn chain(length: usize) -> (Arc<MemoryLedger>, Reference, HashMap<Address, i128>) {
    let ledger = Arc::new(MemoryLedger::new());
    let spender = SigningKey::from_bytes(&[1; 32]);
    let mut tip = Reference::GENESIS;
    for i in 0..length {
        let records = TransferBuilder::new()
            .input(&spender, 1)
            .output(Address::from_bytes([(i % 250) as u8 + 2; 32]), 1, Tag::EMPTY)
            .tips(tip, tip)
            .build()
            .unwrap_or_default();
        if let Some(head) = records.first() {
            tip = head.id;
        }
        ledger.store_all(records);
    }
    let funded = HashMap::from([(address_of_key(&spender), length as i128)]);
    (ledger, tip, funded)
}

fn bench_validation(c: &mut Criterion) {
    let (ledger, tip, funded) = chain(200);

    c.bench_function("validator_cold_200_transfers", |b| {
        b.iter(|| {
            let validator = LedgerValidator::with_initial_balances(
                ledger.clone(),
                LedgerConfig::default(),
                funded.clone(),
            );
            validator.is_history_solid(&[tip])
        })
    });

    let validator =
        LedgerValidator::with_initial_balances(ledger.clone(), LedgerConfig::default(), funded);
    let _ = validator.is_history_solid(&[tip]);
    c.bench_function("validator_warm_200_transfers", |b| {
        b.iter(|| validator.check_structure(tip))
    });
}

criterion_group!(benches, bench_validation);
criterion_main!(benches);
