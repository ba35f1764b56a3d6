//! Fixed-length, content-addressed identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{REFERENCE_HEX_LENGTH, REFERENCE_LENGTH};
use crate::errors::EcError;

macro_rules! fixed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
        pub struct $name(pub [u8; REFERENCE_LENGTH]);

        impl $name {
            /// Wrap raw bytes.
            pub const fn from_bytes(bytes: [u8; REFERENCE_LENGTH]) -> Self {
                Self(bytes)
            }

            /// Raw bytes.
            pub fn as_bytes(&self) -> &[u8; REFERENCE_LENGTH] {
                &self.0
            }

            /// Lowercase hex form.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            /// Parse the hex form, enforcing the fixed length.
            pub fn from_hex(value: &str) -> Result<Self, EcError> {
                if value.len() != REFERENCE_HEX_LENGTH {
                    return Err(EcError::MalformedReference {
                        value: value.to_string(),
                        reason: format!(
                            "expected {REFERENCE_HEX_LENGTH} hex characters, got {}",
                            value.len()
                        ),
                    });
                }
                let mut bytes = [0u8; REFERENCE_LENGTH];
                hex::decode_to_slice(value, &mut bytes).map_err(|e| {
                    EcError::MalformedReference {
                        value: value.to_string(),
                        reason: e.to_string(),
                    }
                })?;
                Ok(Self(bytes))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({}…)", stringify!($name), &self.to_hex()[..12])
            }
        }

        impl FromStr for $name {
            type Err = EcError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = String::deserialize(deserializer)?;
                Self::from_hex(&value).map_err(serde::de::Error::custom)
            }
        }
    };
}

fixed_id!(
    /// Content-addressed identifier of an immutable ledger record.
    Reference
);

fixed_id!(
    /// Ledger address. For signing actors this is the Ed25519 verifying key.
    Address
);

impl Reference {
    /// The designated root of the ledger DAG. Always present, never traversed.
    pub const GENESIS: Reference = Reference([0u8; REFERENCE_LENGTH]);

    /// Whether this is the designated root.
    pub fn is_genesis(&self) -> bool {
        *self == Self::GENESIS
    }

    /// Hash arbitrary bytes into a reference.
    pub fn digest(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }
}
