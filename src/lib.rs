//! # state_trie
//!
//! An authenticated, versioned state store for a blockchain node.
//!
//! state_trie maps arbitrary keys to opaque values in a merkle patricia trie
//! whose root key commits to the whole key space. Nodes are content
//! addressed, stamped with the round that wrote them, and can be bumped to a
//! newer version or pruned once no retained root reaches them.
//!
//! ## Core Concepts
//!
//! - **Paths**: keys expanded to nibbles, consumed as the trie is walked
//! - **Nodes**: leaf, extension and full nodes, addressed by their hash
//! - **Node stores**: where nodes live; any `(key, bytes)` store will do
//! - **Change collector**: the nodes an edit session wrote and superseded
//! - **Versions**: round numbers stamped onto nodes, used as the pruning horizon
//!
//! ## Example
//!
//! ```ignore
//! use state_trie::{MemoryNodeStore, MerklePatriciaTrie, Path};
//! use std::sync::Arc;
//!
//! let mut trie = MerklePatriciaTrie::new(Arc::new(MemoryNodeStore::new()), 1);
//! trie.insert(&Path::from_bytes(b"cat"), &"A".to_string())?;
//! let value: Option<String> = trie.get(&Path::from_bytes(b"cat"))?;
//! ```

pub mod config;
pub mod model;
pub mod ops;
pub mod replay;
pub mod store;
pub mod trie;

mod error;

pub use config::TrieConfig;
pub use error::{Error, InvariantViolation, Result};
pub use model::{Encoded, Key, Path, Sequence, Serializable, ValueNode};
pub use ops::{
    diff_roots, get_changes, prune_below_version, Cancellation, Diff, DiffEntry, PruneStats,
};
pub use replay::{Replay, Round, RoundSummary, Script};
pub use store::{MemoryNodeStore, NodeStore, OverlayNodeStore};
pub use trie::{ChangeCollector, MerklePatriciaTrie, Node, NodeKind, NodeTypes, Visit};

/// Default number of nodes per batched store write
pub const DEFAULT_BATCH_SIZE: usize = 256;
