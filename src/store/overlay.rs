//! Layered node store
//!
//! Block-level edits write into a fresh memory layer stacked on the store
//! holding the previous state. The prior store is never written until the
//! layer is merged, so an abandoned block leaves it untouched.

use super::{MemoryNodeStore, NodeStore};
use crate::model::Key;
use crate::trie::Node;
use crate::{Error, Result};
use log::debug;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// A memory layer over a prior store
pub struct OverlayNodeStore {
    current: MemoryNodeStore,
    prior: Arc<dyn NodeStore>,
    /// Prior keys hidden by deletes in this layer
    deleted: RwLock<HashSet<Key>>,
    propagate_deletes: bool,
}

impl OverlayNodeStore {
    pub fn new(prior: Arc<dyn NodeStore>) -> Self {
        OverlayNodeStore {
            current: MemoryNodeStore::new(),
            prior,
            deleted: RwLock::new(HashSet::new()),
            propagate_deletes: false,
        }
    }

    /// Send deletes straight to the prior store instead of masking them
    pub fn with_propagate_deletes(mut self, propagate: bool) -> Self {
        self.propagate_deletes = propagate;
        self
    }

    pub fn current(&self) -> &MemoryNodeStore {
        &self.current
    }

    pub fn prior(&self) -> &Arc<dyn NodeStore> {
        &self.prior
    }

    fn prior_has(&self, key: &Key) -> Result<bool> {
        match self.prior.get_node(key) {
            Ok(_) => Ok(true),
            Err(Error::NodeNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Flush this layer into the prior store and empty it
    ///
    /// Returns the number of nodes written.
    pub fn merge_into_prior(&self, batch_size: usize) -> Result<usize> {
        let batch_size = batch_size.max(1);
        let mut keys = Vec::with_capacity(batch_size);
        let mut nodes = Vec::with_capacity(batch_size);
        let mut written = 0;

        self.current.iterate(&mut |key, node| {
            keys.push(*key);
            nodes.push(node.clone());
            if keys.len() == batch_size {
                self.prior.multi_put_node(&keys, &nodes)?;
                written += keys.len();
                keys.clear();
                nodes.clear();
            }
            Ok(())
        })?;
        if !keys.is_empty() {
            self.prior.multi_put_node(&keys, &nodes)?;
            written += keys.len();
        }

        let deleted: Vec<Key> = self.deleted.write().drain().collect();
        self.prior.multi_delete_node(&deleted)?;
        self.current.clear();

        debug!(
            "merged overlay: {} nodes written, {} deleted",
            written,
            deleted.len()
        );
        Ok(written)
    }
}

impl NodeStore for OverlayNodeStore {
    fn get_node(&self, key: &Key) -> Result<Node> {
        match self.current.get_node(key) {
            Err(Error::NodeNotFound(_)) => {}
            other => return other,
        }
        if self.deleted.read().contains(key) {
            return Err(Error::NodeNotFound(*key));
        }
        self.prior.get_node(key)
    }

    fn put_node(&self, key: &Key, node: &Node) -> Result<()> {
        self.deleted.write().remove(key);
        self.current.put_node(key, node)
    }

    fn multi_put_node(&self, keys: &[Key], nodes: &[Node]) -> Result<()> {
        self.current.multi_put_node(keys, nodes)?;
        let mut deleted = self.deleted.write();
        for key in keys {
            deleted.remove(key);
        }
        Ok(())
    }

    fn delete_node(&self, key: &Key) -> Result<()> {
        self.current.delete_node(key)?;
        if self.propagate_deletes {
            return self.prior.delete_node(key);
        }
        if self.prior_has(key)? {
            self.deleted.write().insert(*key);
        }
        Ok(())
    }

    fn iterate(&self, visitor: &mut dyn FnMut(&Key, &Node) -> Result<()>) -> Result<()> {
        let mut seen = HashSet::new();
        self.current.iterate(&mut |key, node| {
            seen.insert(*key);
            visitor(key, node)
        })?;

        let deleted = self.deleted.read().clone();
        self.prior.iterate(&mut |key, node| {
            if seen.contains(key) || deleted.contains(key) {
                return Ok(());
            }
            visitor(key, node)
        })
    }

    fn size(&self) -> usize {
        let shadowed = self
            .current
            .keys()
            .iter()
            .filter(|k| self.prior_has(k).unwrap_or(false))
            .count();
        let hidden = self.deleted.read().len();
        (self.current.size() + self.prior.size()).saturating_sub(shadowed + hidden)
    }
}
