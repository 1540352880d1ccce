//! Values stored in the trie

use super::Key;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Anything a caller wants to keep in the trie
///
/// The trie never looks inside a value except to treat an empty encoding as
/// a delete.
pub trait Serializable {
    fn encode(&self) -> Vec<u8>;

    fn decode(bytes: &[u8]) -> crate::Result<Self>
    where
        Self: Sized;
}

impl Serializable for Vec<u8> {
    fn encode(&self) -> Vec<u8> {
        self.clone()
    }

    fn decode(bytes: &[u8]) -> crate::Result<Self> {
        Ok(bytes.to_vec())
    }
}

impl Serializable for String {
    fn encode(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn decode(bytes: &[u8]) -> crate::Result<Self> {
        String::from_utf8(bytes.to_vec()).map_err(|e| crate::Error::Decoding {
            key: String::new(),
            expected: "utf-8 value",
            reason: e.to_string(),
        })
    }
}

/// Stores any serde type in the trie using bincode
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Encoded<T>(pub T);

impl<T: Serialize + DeserializeOwned> Serializable for Encoded<T> {
    fn encode(&self) -> Vec<u8> {
        bincode::serialize(&self.0).expect("serialization should not fail")
    }

    fn decode(bytes: &[u8]) -> crate::Result<Self> {
        Ok(Encoded(bincode::deserialize(bytes)?))
    }
}

/// The opaque value carried by a leaf or full node
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueNode(Vec<u8>);

impl ValueNode {
    pub fn new(bytes: Vec<u8>) -> Self {
        ValueNode(bytes)
    }

    /// Wrap the encoding of a serializable value
    pub fn from_value(value: &impl Serializable) -> Self {
        ValueNode(value.encode())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn hash(&self) -> Key {
        Key::digest(&self.0)
    }

    /// Rebuild the caller's type from the stored bytes
    pub fn decode<T: Serializable>(&self) -> crate::Result<T> {
        T::decode(&self.0)
    }
}

impl fmt::Debug for ValueNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if !s.is_empty() && s.chars().all(|c| !c.is_control()) => {
                write!(f, "ValueNode({:?})", s)
            }
            _ => write!(f, "ValueNode(0x{})", hex::encode(&self.0)),
        }
    }
}
