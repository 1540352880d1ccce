//! Content-addressed node store
//!
//! The trie reaches every node through a [`NodeStore`]. Stores are keyed by the
//! node's own hash and hold nodes as plain `(Key, bytes)` records, so any
//! key-value backend can sit behind the trait.

mod memory;
mod overlay;
mod record;

pub use memory::MemoryNodeStore;
pub use overlay::OverlayNodeStore;
pub use record::{decode_node, encode_node, NodeRecord};

use crate::model::Key;
use crate::trie::Node;
use crate::{Error, Result};

/// Storage contract the trie needs
///
/// `get_node` on a missing key is always `Error::NodeNotFound`, never an
/// empty node. Implementations may block; the trie calls them many times per
/// operation.
pub trait NodeStore: Send + Sync {
    fn get_node(&self, key: &Key) -> Result<Node>;

    fn put_node(&self, key: &Key, node: &Node) -> Result<()>;

    /// Write a batch; `keys[i]` addresses `nodes[i]`
    fn multi_put_node(&self, keys: &[Key], nodes: &[Node]) -> Result<()> {
        check_batch(keys, nodes)?;
        for (key, node) in keys.iter().zip(nodes) {
            self.put_node(key, node)?;
        }
        Ok(())
    }

    /// Remove a node. Removing an absent key is not an error.
    fn delete_node(&self, key: &Key) -> Result<()>;

    fn multi_delete_node(&self, keys: &[Key]) -> Result<()> {
        for key in keys {
            self.delete_node(key)?;
        }
        Ok(())
    }

    /// Visit every stored node. An error from the visitor stops the scan.
    fn iterate(&self, visitor: &mut dyn FnMut(&Key, &Node) -> Result<()>) -> Result<()>;

    /// Number of stored nodes
    fn size(&self) -> usize;
}

pub(crate) fn check_batch(keys: &[Key], nodes: &[Node]) -> Result<()> {
    if keys.len() != nodes.len() {
        return Err(Error::InvalidBatch(format!(
            "{} keys for {} nodes",
            keys.len(),
            nodes.len()
        )));
    }
    Ok(())
}
