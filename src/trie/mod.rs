//! Merkle patricia trie
//!
//! Keys are nibble paths. Nodes are content addressed: a node's key is the
//! hash of its canonical encoding, so the root key commits to every value
//! in the trie and identical subtrees share storage.

mod change_collector;
mod iterate;
mod node;
mod tree;

pub use change_collector::{ChangeCollector, NodeChange};
pub use iterate::Visit;
pub use node::{
    ExtensionNode, FullNode, LeafNode, Node, NodeKind, NodeTypes, FULL_NODE_CHILDREN,
};
pub use tree::MerklePatriciaTrie;
