//! ContentHash: the SHA-512 digest identifying a piece of stored content.
//!
//! The hash doubles as the physical storage address: the first characters
//! become nested shard directories so no single directory accumulates an
//! unbounded number of objects. Changing the algorithm requires rehashing
//! every stored object, so it is fixed here and nowhere else.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;

/// Hex length of a SHA-512 digest.
pub const HASH_HEX_LEN: usize = 128;

/// Number of leading hex characters split into shard directories.
const SHARD_DEPTH: usize = 5;

/// A content hash - lowercase hex SHA-512 of the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

/// Errors that can occur when parsing a content hash.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("invalid hash length: expected {HASH_HEX_LEN} hex chars, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex character in hash")]
    InvalidHex,
}

impl ContentHash {
    /// Hash raw bytes and return the content hash.
    pub fn from_data(data: &[u8]) -> Self {
        Self(hex::encode(Sha512::digest(data)))
    }

    /// Create from an existing hash string (validates format).
    pub fn from_str_checked(s: &str) -> Result<Self, HashError> {
        if s.len() != HASH_HEX_LEN {
            return Err(HashError::InvalidLength(s.len()));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(HashError::InvalidHex);
        }
        Ok(Self(s.to_lowercase()))
    }

    /// Leading characters used for directory sharding.
    pub fn prefix(&self) -> &str {
        &self.0[..SHARD_DEPTH]
    }

    /// Remainder after the prefix, used as the object filename.
    pub fn remainder(&self) -> &str {
        &self.0[SHARD_DEPTH..]
    }

    /// Relative storage path: one directory per prefix character, the
    /// remainder as filename. Pure function of the hash.
    pub fn shard_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        for c in self.prefix().chars() {
            path.push(c.to_string());
        }
        path.push(self.remainder());
        path
    }

    /// The full hash as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentHash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_checked(s)
    }
}

impl AsRef<str> for ContentHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_data_produces_full_hex_digest() {
        let hash = ContentHash::from_data(b"Hello, World!");
        assert_eq!(hash.as_str().len(), HASH_HEX_LEN);
        assert!(hash.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_from_data_is_deterministic() {
        let hash1 = ContentHash::from_data(b"test data");
        let hash2 = ContentHash::from_data(b"test data");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_from_data_different_input_different_hash() {
        let hash1 = ContentHash::from_data(b"data a");
        let hash2 = ContentHash::from_data(b"data b");
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_known_digest() {
        // SHA-512 of "hello world"
        let hash = ContentHash::from_data(b"hello world");
        assert_eq!(
            hash.as_str(),
            "309ecc489c12d6eb4cc40f50c902f2b4d0ed77ee511a7c7a9bcd3ca86d4cd86f\
             989dd35bc5ff499670da34255b45b0cfd830e81f605dcf7dc5542e93ae9cd76f"
        );
    }

    #[test]
    fn test_shard_path_shape() {
        let hash = ContentHash::from_data(b"test");
        let path = hash.shard_path();

        let components: Vec<_> = path
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        assert_eq!(components.len(), 6);
        for dir in &components[..5] {
            assert_eq!(dir.len(), 1);
        }
        assert_eq!(components[5], hash.remainder());
        assert_eq!(components[..5].join(""), hash.prefix());
    }

    #[test]
    fn test_prefix_and_remainder_recompose() {
        let hash = ContentHash::from_data(b"recompose");
        assert_eq!(
            format!("{}{}", hash.prefix(), hash.remainder()),
            hash.as_str()
        );
    }

    #[test]
    fn test_from_str_valid() {
        let hash_str: String = "ab".repeat(64);
        let hash: ContentHash = hash_str.parse().unwrap();
        assert_eq!(hash.as_str(), hash_str);
    }

    #[test]
    fn test_from_str_invalid_length() {
        let result: Result<ContentHash, _> = "short".parse();
        assert!(matches!(result, Err(HashError::InvalidLength(5))));
    }

    #[test]
    fn test_from_str_invalid_hex() {
        let result: Result<ContentHash, _> = "zz".repeat(64).parse();
        assert!(matches!(result, Err(HashError::InvalidHex)));
    }

    #[test]
    fn test_serde_roundtrip() {
        let hash = ContentHash::from_data(b"serde test");
        let json = serde_json::to_string(&hash).unwrap();
        let restored: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(hash, restored);
    }

    #[test]
    fn test_display() {
        let hash = ContentHash::from_data(b"display test");
        assert_eq!(format!("{}", hash), hash.as_str());
    }
}
