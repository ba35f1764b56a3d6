//! Fixed-width auxiliary data carried by every transaction.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{TAG_LENGTH, TAG_PADDING};

/// Fixed-length ASCII tag. Markers use it to carry an encoded confidence;
/// transfers use it for a short label.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag([u8; TAG_LENGTH]);

impl Tag {
    /// A tag carrying no data.
    pub const EMPTY: Tag = Tag([TAG_PADDING; TAG_LENGTH]);

    /// Build a tag from a label, truncating or padding to the fixed width.
    /// Non-ASCII bytes are replaced by the padding byte.
    pub fn from_label(label: &str) -> Self {
        let mut bytes = [TAG_PADDING; TAG_LENGTH];
        for (slot, byte) in bytes.iter_mut().zip(label.bytes()) {
            *slot = if byte.is_ascii_graphic() { byte } else { TAG_PADDING };
        }
        Self(bytes)
    }

    /// Wrap raw bytes.
    pub const fn from_bytes(bytes: [u8; TAG_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; TAG_LENGTH] {
        &self.0
    }

    /// The tag as text, padding included.
    pub fn as_str(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self.as_str())
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_str())
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        if value.len() != TAG_LENGTH || !value.is_ascii() {
            return Err(serde::de::Error::custom(format!(
                "tag must be {TAG_LENGTH} ASCII characters"
            )));
        }
        let mut bytes = [TAG_PADDING; TAG_LENGTH];
        bytes.copy_from_slice(value.as_bytes());
        Ok(Self(bytes))
    }
}
