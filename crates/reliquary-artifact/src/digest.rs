//! Content digest primitives
//!
//! Provides [`ContentDigest`], a strongly-typed 32-byte SHA-256 digest used
//! as the sole acceptance criterion when verifying retrieved artifacts.

use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Length of a SHA-256 digest in bytes
pub const DIGEST_LEN: usize = 32;

/// A 32-byte content digest (SHA-256)
///
/// Immutable and cheap to clone (Copy). Displays as lowercase hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentDigest([u8; DIGEST_LEN]);

impl ContentDigest {
    /// Create a new digest from raw bytes
    #[inline]
    #[must_use]
    pub const fn new(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Create digest from byte slice
    ///
    /// # Errors
    /// Returns error if slice length is not exactly 32 bytes
    #[inline]
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DigestError> {
        let arr: [u8; DIGEST_LEN] = bytes.try_into().map_err(|_| DigestError::InvalidLength {
            expected: DIGEST_LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Compute the SHA-256 digest of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&Sha256::digest(data));
        Self(out)
    }

    /// Parse a hex digest, normalizing case, surrounding whitespace and an
    /// optional `0x` prefix.
    ///
    /// Returns `Ok(None)` for an empty (unset) value.
    ///
    /// # Errors
    /// Returns error if the value is not 64 hex characters after normalization
    pub fn parse_normalized(s: &str) -> Result<Option<Self>, DigestError> {
        let trimmed = s.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if hex_part.is_empty() {
            return Ok(None);
        }
        hex_part.parse().map(Some)
    }

    /// Check whether `data` hashes to this digest
    #[inline]
    #[must_use]
    pub fn matches(&self, data: &[u8]) -> bool {
        Self::compute(data) == *self
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for ContentDigest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for ContentDigest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        Self::from_slice(&bytes)
    }
}

impl AsRef<[u8]> for ContentDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// Digests persist as hex strings in snapshots
impl serde::Serialize for ContentDigest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for ContentDigest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ContentDigest::parse_normalized(&s)
            .map_err(serde::de::Error::custom)?
            .ok_or_else(|| serde::de::Error::custom("empty digest"))
    }
}

/// Errors that can occur when working with content digests
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    /// Invalid digest length
    #[error("invalid digest length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Hex encoding error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("abc")
    const ABC_HEX: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn compute_known_vector() {
        let digest = ContentDigest::compute(b"abc");
        assert_eq!(digest.to_string(), ABC_HEX);
    }

    #[test]
    fn from_slice_invalid_length() {
        let result = ContentDigest::from_slice(&[1u8; 31]);
        assert!(matches!(
            result,
            Err(DigestError::InvalidLength { expected: 32, actual: 31 })
        ));
    }

    #[test]
    fn parse_normalized_accepts_case_and_prefix() {
        let upper = format!("  0x{}  ", ABC_HEX.to_uppercase());
        let parsed = ContentDigest::parse_normalized(&upper).unwrap().unwrap();
        assert_eq!(parsed, ContentDigest::compute(b"abc"));
    }

    #[test]
    fn parse_normalized_empty_is_unset() {
        assert!(ContentDigest::parse_normalized("").unwrap().is_none());
        assert!(ContentDigest::parse_normalized("   ").unwrap().is_none());
        assert!(ContentDigest::parse_normalized("0x").unwrap().is_none());
    }

    #[test]
    fn parse_normalized_rejects_garbage() {
        assert!(ContentDigest::parse_normalized("not-hex").is_err());
        assert!(ContentDigest::parse_normalized("abcd").is_err());
    }

    #[test]
    fn matches_content() {
        let digest = ContentDigest::compute(b"B's content");
        assert!(digest.matches(b"B's content"));
        assert!(!digest.matches(b"C's content"));
    }

    #[test]
    fn short_is_prefix() {
        let digest = ContentDigest::compute(b"test");
        assert_eq!(digest.short().len(), 16);
        assert!(digest.to_string().starts_with(&digest.short()));
    }

    #[test]
    fn serde_json_uses_hex_string() {
        let digest = ContentDigest::compute(b"test");
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{digest}\""));
        let decoded: ContentDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(digest, decoded);
    }
}
