//! Nibble paths

use serde::{Deserialize, Serialize};
use std::fmt;

const HEX_CHARS: &[u8; 16] = b"0123456789abcdef";

/// An ordered sequence of nibbles (0..=15) describing a route through the trie
///
/// Paths are built from external keys by hex-nibble expansion (high nibble
/// first). The trie only ever compares, slices and concatenates them.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>")]
pub struct Path(Vec<u8>);

impl Path {
    /// The empty path
    pub fn new() -> Self {
        Path(Vec::new())
    }

    /// Expand every byte of `key` into two nibbles
    pub fn from_bytes(key: &[u8]) -> Self {
        let mut nibbles = Vec::with_capacity(key.len() * 2);
        for b in key {
            nibbles.push(b >> 4);
            nibbles.push(b & 0x0f);
        }
        Path(nibbles)
    }

    /// Build a path from raw nibbles
    pub fn from_nibbles(nibbles: impl Into<Vec<u8>>) -> crate::Result<Self> {
        let nibbles = nibbles.into();
        if let Some(bad) = nibbles.iter().find(|n| **n > 0x0f) {
            return Err(crate::Error::InvalidPath(format!("nibble out of range: {}", bad)));
        }
        Ok(Path(nibbles))
    }

    /// Parse a path written as hex characters, one nibble per char
    pub fn from_hex(s: &str) -> crate::Result<Self> {
        let nibbles = s
            .chars()
            .map(|c| {
                c.to_digit(16)
                    .map(|d| d as u8)
                    .ok_or_else(|| crate::Error::InvalidPath(format!("not a hex digit: {:?}", c)))
            })
            .collect::<crate::Result<Vec<u8>>>()?;
        Ok(Path(nibbles))
    }

    /// Pack the nibbles back into bytes; `None` for odd-length paths
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        if self.0.len() % 2 != 0 {
            return None;
        }
        Some(self.0.chunks(2).map(|p| (p[0] << 4) | p[1]).collect())
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|n| HEX_CHARS[*n as usize] as char).collect()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, nibble: u8) {
        debug_assert!(nibble <= 0x0f);
        self.0.push(nibble);
    }

    pub fn extend_from_slice(&mut self, nibbles: &[u8]) {
        self.0.extend_from_slice(nibbles);
    }

    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// `prefix` followed by `suffix`
    pub(crate) fn joined(prefix: &[u8], suffix: &[u8]) -> Self {
        let mut nibbles = Vec::with_capacity(prefix.len() + suffix.len());
        nibbles.extend_from_slice(prefix);
        nibbles.extend_from_slice(suffix);
        Path(nibbles)
    }

    /// Wrap nibbles already known to be in range
    pub(crate) fn from_slice_unchecked(nibbles: &[u8]) -> Self {
        Path(nibbles.to_vec())
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        self.0.iter().all(|n| *n <= 0x0f)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({})", self.to_hex())
    }
}

impl TryFrom<Vec<u8>> for Path {
    type Error = crate::Error;

    fn try_from(nibbles: Vec<u8>) -> crate::Result<Self> {
        Path::from_nibbles(nibbles)
    }
}

impl AsRef<[u8]> for Path {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Length of the common prefix of two nibble slices
pub fn matching_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}
