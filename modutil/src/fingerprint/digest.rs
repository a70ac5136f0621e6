//! The 160-bit digest value type.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Length of a SHA-1 digest in bytes.
pub const DIGEST_LEN: usize = 20;

/// A SHA-1 content digest.
///
/// Displays as 40 lowercase hex characters. Parsing accepts either case.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

/// Error returned when a string is not a valid hex digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DigestParseError {
    /// Wrong number of hex characters.
    #[error("expected {} hex characters, got {0}", DIGEST_LEN * 2)]
    InvalidLength(usize),

    /// A character outside `[0-9a-fA-F]`.
    #[error("invalid hex character {0:?}")]
    InvalidChar(char),
}

impl Digest {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex representation.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }

    /// Compare against a hex string, ignoring case.
    ///
    /// Returns `false` for anything that is not a well-formed digest.
    pub fn matches_hex(&self, hex: &str) -> bool {
        hex.trim()
            .parse::<Digest>()
            .map(|other| other == *self)
            .unwrap_or(false)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self)
    }
}

impl FromStr for Digest {
    type Err = DigestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != DIGEST_LEN * 2 {
            return Err(DigestParseError::InvalidLength(chars.len()));
        }

        let mut bytes = [0u8; DIGEST_LEN];
        for (i, pair) in chars.chunks(2).enumerate() {
            let hi = hex_value(pair[0])?;
            let lo = hex_value(pair[1])?;
            bytes[i] = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }
}

fn hex_value(c: char) -> Result<u8, DigestParseError> {
    c.to_digit(16)
        .map(|v| v as u8)
        .ok_or(DigestParseError::InvalidChar(c))
}
