//! Protocol-wide constants.

/// Length in bytes of a [`Reference`](crate::models::Reference) or
/// [`Address`](crate::models::Address).
pub const REFERENCE_LENGTH: usize = 32;

/// Length of a reference in its textual (hex) form.
pub const REFERENCE_HEX_LENGTH: usize = REFERENCE_LENGTH * 2;

/// Length of a candidate-history id in its textual form (two references).
pub const HISTORY_ID_LENGTH: usize = REFERENCE_HEX_LENGTH * 2;

/// Fixed width of a transaction tag, in bytes.
pub const TAG_LENGTH: usize = 27;

/// Number of leading tag bytes holding an encoded confidence.
pub const CONFIDENCE_DIGITS: usize = 7;

/// Quantization scale of an encoded confidence (resolution `1 / CONFIDENCE_SCALE`).
pub const CONFIDENCE_SCALE: u32 = 1_000_000;

/// Filler byte for the unused part of a tag.
pub const TAG_PADDING: u8 = b'_';

/// Default positive-feedback bias applied to the previous round's leader.
pub const DEFAULT_AGGRESSIVITY: f64 = 1.1;

/// Default divisor damping each published confidence step (move 1/20th of the way).
pub const DEFAULT_PUBLISH_DAMPING: f64 = 20.0;

/// Default approval confidence above which a record counts as confirmed.
pub const DEFAULT_CONFIRMATION_CONFIDENCE: f64 = 0.95;

/// Default upper bound on records walked inside one atomic transfer.
pub const DEFAULT_MAX_TRANSFER_RECORDS: usize = 64;

/// Tag label on the outputs of transfers sent through the engine.
pub const TRANSFER_TAG_LABEL: &str = "EC_TRANSFER";

/// Tag label on the remainder output returning change to the sender.
pub const REMAINDER_TAG_LABEL: &str = "EC_REMAINDER";
