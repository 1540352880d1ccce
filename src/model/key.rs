//! Content-addressed node key using BLAKE3

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte BLAKE3 digest of a node's canonical encoding
///
/// Keys are the only handle the trie uses to reach a node. Two nodes with the
/// same encoding share a key, which is how identical subtrees get deduplicated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Key([u8; 32]);

impl Key {
    /// The zero key, used as the root of an empty trie
    pub const ZERO: Key = Key([0u8; 32]);

    /// Number of bytes in a key
    pub const LEN: usize = 32;

    /// Create a key from raw digest bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Key(bytes)
    }

    /// Create a key from a slice, which must be exactly 32 bytes long
    pub fn from_slice(bytes: &[u8]) -> crate::Result<Self> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| {
            crate::Error::InvalidKey(format!("expected {} bytes, got {}", Self::LEN, bytes.len()))
        })?;
        Ok(Key(arr))
    }

    /// Digest arbitrary data
    pub fn digest(data: &[u8]) -> Self {
        Key(*blake3::hash(data).as_bytes())
    }

    /// Digest several pieces of data as one message
    pub fn digest_many(parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for part in parts {
            hasher.update(part);
        }
        Key(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        let bytes = hex::decode(s).map_err(|e| crate::Error::InvalidKey(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    /// First 8 hex chars, enough to tell keys apart in logs
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }

    /// Check if this is the empty-root sentinel
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self.short())
    }
}

impl Default for Key {
    fn default() -> Self {
        Key::ZERO
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
