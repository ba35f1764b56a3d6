//! Atomic transfers.
//!
//! A transfer is a run of records linked head → tail through `parent1`. Its
//! values must sum to zero and every input (negative value) must carry a
//! signature over the transfer essence.

use ed25519_dalek::{Signer, SigningKey};

use ec_core::errors::{EcResult, LedgerError};
use ec_core::models::{Address, Reference, Signature, Tag, Transaction};
use ec_core::traits::LedgerLink;

/// Hash of what the inputs sign: `(address, value, tag)` of every record,
/// head to tail. Parents are excluded so the transfer can be attached anywhere.
pub fn transfer_essence(records: &[Transaction]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(records.len() as u64).to_be_bytes());
    for record in records {
        hasher.update(record.address.as_bytes());
        hasher.update(&record.value.to_be_bytes());
        hasher.update(record.tag.as_bytes());
    }
    *hasher.finalize().as_bytes()
}

/// Collect the records of the transfer starting at `head`, head first.
///
/// Fails with [`LedgerError::IncompleteHistory`] if a record of the transfer
/// is not locally visible yet.
pub fn collect_transfer(
    head: &Transaction,
    ledger: &dyn LedgerLink,
    max_records: usize,
) -> Result<Vec<Transaction>, LedgerError> {
    if !head.is_atomic_head {
        return Err(malformed(head.id, "record is not a transfer head"));
    }
    let mut records = vec![head.clone()];
    while let Some(current) = records.last().filter(|r| !r.is_atomic_tail) {
        if records.len() >= max_records {
            return Err(malformed(
                head.id,
                &format!("more than {max_records} records without a tail"),
            ));
        }
        let next_ref = current.parent1;
        let next = ledger
            .resolve(&next_ref)
            .ok_or(LedgerError::IncompleteHistory { missing: next_ref })?;
        if next.id != next_ref || !next.is_sealed() {
            return Err(LedgerError::MalformedRecord {
                reference: next_ref,
            });
        }
        if next.is_atomic_head {
            return Err(malformed(head.id, "nested transfer head"));
        }
        records.push(next);
    }
    Ok(records)
}

fn malformed(head: Reference, reason: &str) -> LedgerError {
    LedgerError::MalformedTransfer {
        head,
        reason: reason.to_string(),
    }
}

/// Address controlled by an Ed25519 key.
pub fn address_of_key(key: &SigningKey) -> Address {
    Address::from_bytes(key.verifying_key().to_bytes())
}

/// Builds a signed atomic transfer.
///
/// # Examples
///
/// ```
/// use ec_core::models::{Address, Reference, Tag};
/// use ec_ledger::TransferBuilder;
/// use ed25519_dalek::SigningKey;
///
/// let key = SigningKey::from_bytes(&[1; 32]);
/// let records = TransferBuilder::new()
///     .input(&key, 10)
///     .output(Address::from_bytes([2; 32]), 10, Tag::from_label("RECEIVER"))
///     .build()
///     .unwrap();
/// assert!(records[0].is_atomic_head);
/// assert!(records.last().unwrap().is_atomic_tail);
/// ```
#[derive(Default)]
pub struct TransferBuilder {
    inputs: Vec<(SigningKey, i64)>,
    outputs: Vec<(Address, i64, Tag)>,
    trunk: Option<Reference>,
    branch: Option<Reference>,
}

impl TransferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spend `amount` from the key's address.
    pub fn input(mut self, key: &SigningKey, amount: i64) -> Self {
        self.inputs.push((key.clone(), amount));
        self
    }

    /// Credit `value` to `address`.
    pub fn output(mut self, address: Address, value: i64, tag: Tag) -> Self {
        self.outputs.push((address, value, tag));
        self
    }

    /// Attach the transfer on top of two existing records. Defaults to genesis.
    pub fn tips(mut self, trunk: Reference, branch: Reference) -> Self {
        self.trunk = Some(trunk);
        self.branch = Some(branch);
        self
    }

    /// Build the records, head first. Every record is sealed.
    pub fn build(self) -> EcResult<Vec<Transaction>> {
        let trunk = self.trunk.unwrap_or(Reference::GENESIS);
        let branch = self.branch.unwrap_or(Reference::GENESIS);

        let mut records: Vec<Transaction> = self
            .outputs
            .iter()
            .map(|(address, value, tag)| unsigned(*address, *value, *tag))
            .chain(
                self.inputs
                    .iter()
                    .map(|(key, amount)| unsigned(address_of_key(key), -amount, Tag::EMPTY)),
            )
            .collect();
        if records.is_empty() {
            return Err(malformed(Reference::GENESIS, "transfer has no records").into());
        }

        let essence = transfer_essence(&records);
        let output_count = self.outputs.len();
        for (record, (key, _)) in records[output_count..].iter_mut().zip(&self.inputs) {
            let message = Signature::signing_message(0, &essence);
            record.signature = Some(Signature {
                index: 0,
                bytes: key.sign(&message),
            });
        }

        let last = records.len() - 1;
        records[0].is_atomic_head = true;
        records[last].is_atomic_tail = true;

        let mut next = trunk;
        for record in records.iter_mut().rev() {
            record.parent1 = next;
            record.parent2 = branch;
            *record = record.clone().seal();
            next = record.id;
        }
        Ok(records)
    }
}

fn unsigned(address: Address, value: i64, tag: Tag) -> Transaction {
    Transaction {
        id: Reference::GENESIS,
        address,
        value,
        parent1: Reference::GENESIS,
        parent2: Reference::GENESIS,
        tag,
        is_atomic_head: false,
        is_atomic_tail: false,
        signature: None,
    }
}
