//! Confidence values and their fixed-width tag encoding.
//!
//! The codec is a pair of pure functions shared by the observer (decode) and
//! the autonomous actor (encode). The first [`CONFIDENCE_DIGITS`] bytes of a
//! tag hold `round(confidence × CONFIDENCE_SCALE)` as zero-padded decimal
//! digits; the rest is padding.
//!
//! # Examples
//!
//! ```
//! use ec_core::models::{decode_confidence, encode_confidence};
//!
//! let tag = encode_confidence(0.25);
//! assert!(tag.as_str().starts_with("0250000"));
//! assert!((decode_confidence(&tag).unwrap() - 0.25).abs() < 1e-9);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{CONFIDENCE_DIGITS, CONFIDENCE_SCALE, TAG_LENGTH, TAG_PADDING};
use crate::errors::{ConsensusError, EcResult};

use super::tag::Tag;

/// Belief in [0.0, 1.0] that a reference is part of the eventually-agreed history.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Confidence(f64);

impl Confidence {
    /// No belief at all.
    pub const ZERO: Confidence = Confidence(0.0);
    /// Full belief.
    pub const CERTAIN: Confidence = Confidence(1.0);

    /// Create a new Confidence, clamping to [0.0, 1.0]. NaN becomes 0.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Get the raw f64 value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// The quantized integer this confidence is published as.
    pub fn quantized(self) -> u32 {
        (self.0 * CONFIDENCE_SCALE as f64).round() as u32
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

/// Encode a confidence into a marker tag. Values are clamped to [0, 1].
pub fn encode_confidence(value: f64) -> Tag {
    let quantized = Confidence::new(value).quantized();
    let digits = format!("{quantized:0width$}", width = CONFIDENCE_DIGITS);
    let mut bytes = [TAG_PADDING; TAG_LENGTH];
    bytes[..CONFIDENCE_DIGITS].copy_from_slice(digits.as_bytes());
    Tag::from_bytes(bytes)
}

/// Decode the confidence carried by a marker tag.
pub fn decode_confidence(tag: &Tag) -> EcResult<f64> {
    let digits = &tag.as_bytes()[..CONFIDENCE_DIGITS];
    if !digits.iter().all(u8::is_ascii_digit) {
        return Err(ConsensusError::InvalidTag(tag.as_str()).into());
    }
    let quantized = digits
        .iter()
        .fold(0u32, |acc, digit| acc * 10 + u32::from(digit - b'0'));
    if quantized > CONFIDENCE_SCALE {
        return Err(ConsensusError::InvalidTag(tag.as_str()).into());
    }
    Ok(f64::from(quantized) / f64::from(CONFIDENCE_SCALE))
}
