//! Error types for state_trie

use crate::model::Key;
use thiserror::Error;

/// Result type alias for state_trie operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in state_trie operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The path does not end at a stored value. Expected in normal operation.
    #[error("Value not present")]
    ValueNotPresent,

    /// The node graph references a key the store cannot resolve.
    #[error("Node not found: {0}")]
    NodeNotFound(Key),

    #[error("Failed to decode {expected} at {key}: {reason}")]
    Decoding {
        key: String,
        expected: &'static str,
        reason: String,
    },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid script: {0}")]
    Script(String),

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// Data or program states that cannot occur in a well-formed trie
///
/// These are never recoverable: retrying reads the same bytes again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("Unknown node type tag {tag:#04x} at {key}")]
    UnknownNodeType { key: String, tag: u8 },

    #[error("Malformed trie structure at {key}: {detail}")]
    Structure { key: Key, detail: String },

    #[error("Root mismatch: stored under {expected}, hashes to {actual}")]
    RootMismatch { expected: Key, actual: Key },
}

impl Error {
    pub fn is_value_not_present(&self) -> bool {
        matches!(self, Error::ValueNotPresent)
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::Invariant(_))
    }

    /// Whether repeating the same call could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Io(_) | Error::Cancelled)
    }
}
