//! # Content identifiers
//!
//! A `ContentId` is the SHA-256 digest of a blob. It is the blob's name, its
//! lookup key, and its integrity check at the same time.

use std::fmt;
use std::str::FromStr;

use sha2::Digest;
use sha2::Sha256;

/// Hash-derived identifier of an immutable byte sequence.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ContentId([u8; 32]);

impl ContentId {
    /// Length of the raw digest in bytes.
    pub const LEN: usize = 32;

    /// Computes the id of `bytes`.
    pub fn of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Builds an id from a raw digest slice, or `None` if it is not 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(bytes).ok().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns true if `bytes` hash to this id.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        Self::of(bytes) == *self
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_string();
        write!(f, "ContentId({}…)", &hex[..12])
    }
}

/// Error returned when parsing a hex id fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseIdError {
    /// Expected 64 hex characters.
    Length(usize),
    /// Non-hex character at the given position.
    Digit(usize),
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Length(n) => write!(f, "expected 64 hex characters, found {}", n),
            Self::Digit(i) => write!(f, "invalid hex digit at position {}", i),
        }
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for ContentId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bytes = hex::decode(s).map_err(|e| match e {
            hex::FromHexError::InvalidHexCharacter { index, .. } => ParseIdError::Digit(index),
            hex::FromHexError::OddLength | hex::FromHexError::InvalidStringLength => {
                ParseIdError::Length(s.len())
            }
        })?;
        Self::from_slice(&bytes).ok_or(ParseIdError::Length(s.len()))
    }
}
