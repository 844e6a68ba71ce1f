//! Twelve-byte document identifiers.
//!
//! An [`ObjectId`] is laid out like a MongoDB object id: a 4-byte big-endian
//! creation timestamp, 5 random bytes and a 3-byte counter. Its external form
//! is always 24 hex characters.

use crate::{ConceptError, ConceptResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Error returned when a string cannot be turned into an [`ObjectId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectIdError {
    /// The string was not exactly 24 characters.
    InvalidLength(usize),
    /// The string contained a non-hex character.
    InvalidHex,
}

impl fmt::Display for ObjectIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectIdError::InvalidLength(n) => write!(f, "expected 24 hex characters, got {n}"),
            ObjectIdError::InvalidHex => write!(f, "not a hexadecimal string"),
        }
    }
}

impl std::error::Error for ObjectIdError {}

/// A document identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Length of the hex representation.
    pub const HEX_LEN: usize = 24;

    /// Generate a fresh identifier.
    pub fn generate() -> ConceptResult<Self> {
        let mut bytes = [0u8; 12];
        let secs = chrono::Utc::now().timestamp() as u32;
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        getrandom::getrandom(&mut bytes[4..9])
            .map_err(|e| ConceptError::Store(format!("Failed to generate id: {e}")))?;
        let count = COUNTER.fetch_add(1, Ordering::Relaxed);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Ok(Self(bytes))
    }

    /// Parse a 24-character hex string (either case).
    pub fn parse_str(s: &str) -> Result<Self, ObjectIdError> {
        if s.len() != Self::HEX_LEN {
            return Err(ObjectIdError::InvalidLength(s.chars().count()));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| ObjectIdError::InvalidHex)?;
        Ok(Self(bytes))
    }

    /// The raw bytes.
    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_str(&s).map_err(serde::de::Error::custom)
    }
}
