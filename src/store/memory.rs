//! In-memory node store

use super::{check_batch, decode_node, encode_node, NodeStore};
use crate::model::Key;
use crate::trie::Node;
use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A node store held in a hash map of encoded records
///
/// Nodes go through the same record encoding a persistent backend would use,
/// so every read exercises decoding.
#[derive(Default)]
pub struct MemoryNodeStore {
    nodes: RwLock<HashMap<Key, Vec<u8>>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.nodes.read().contains_key(key)
    }

    /// All stored keys in ascending order
    pub fn keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.nodes.read().keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn clear(&self) {
        self.nodes.write().clear();
    }

    /// Find the root of the node graph held in this store
    ///
    /// The root is a node no other stored node points to. When several
    /// qualify (a partial change set can hold disjoint fragments), the one
    /// reaching the most stored nodes wins, then the smallest key.
    pub fn compute_root(&self) -> Result<Option<Key>> {
        let mut nodes = BTreeMap::new();
        self.iterate(&mut |key, node| {
            nodes.insert(*key, node.clone());
            Ok(())
        })?;

        let mut referenced = HashSet::new();
        for node in nodes.values() {
            match node {
                Node::Full(full) => referenced.extend(full.iter_children().map(|(_, k)| *k)),
                Node::Extension(ext) => {
                    referenced.insert(ext.child);
                }
                Node::Leaf(_) => {}
            }
        }

        let mut best: Option<(Key, usize)> = None;
        for key in nodes.keys().filter(|k| !referenced.contains(*k)) {
            let reach = reachable_count(&nodes, key);
            if best.map_or(true, |(_, n)| reach > n) {
                best = Some((*key, reach));
            }
        }
        Ok(best.map(|(key, _)| key))
    }
}

fn reachable_count(nodes: &BTreeMap<Key, Node>, start: &Key) -> usize {
    let mut seen = HashSet::new();
    let mut stack = vec![*start];
    while let Some(key) = stack.pop() {
        let Some(node) = nodes.get(&key) else {
            continue;
        };
        if !seen.insert(key) {
            continue;
        }
        match node {
            Node::Full(full) => stack.extend(full.iter_children().map(|(_, k)| *k)),
            Node::Extension(ext) => stack.push(ext.child),
            Node::Leaf(_) => {}
        }
    }
    seen.len()
}

impl NodeStore for MemoryNodeStore {
    fn get_node(&self, key: &Key) -> Result<Node> {
        let data = {
            let nodes = self.nodes.read();
            nodes.get(key).cloned()
        };
        let data = data.ok_or(Error::NodeNotFound(*key))?;
        decode_node(key, &data)
    }

    fn put_node(&self, key: &Key, node: &Node) -> Result<()> {
        debug_assert_eq!(*key, node.hash(), "node stored under a foreign key");
        let data = encode_node(node);
        self.nodes.write().insert(*key, data);
        Ok(())
    }

    fn multi_put_node(&self, keys: &[Key], nodes: &[Node]) -> Result<()> {
        check_batch(keys, nodes)?;
        let encoded: Vec<Vec<u8>> = nodes.iter().map(encode_node).collect();

        let mut store = self.nodes.write();
        for (key, data) in keys.iter().zip(encoded) {
            store.insert(*key, data);
        }
        Ok(())
    }

    fn delete_node(&self, key: &Key) -> Result<()> {
        self.nodes.write().remove(key);
        Ok(())
    }

    fn multi_delete_node(&self, keys: &[Key]) -> Result<()> {
        let mut store = self.nodes.write();
        for key in keys {
            store.remove(key);
        }
        Ok(())
    }

    fn iterate(&self, visitor: &mut dyn FnMut(&Key, &Node) -> Result<()>) -> Result<()> {
        // Snapshot first so the visitor may write back into this store
        let mut entries: Vec<(Key, Vec<u8>)> = {
            let nodes = self.nodes.read();
            nodes.iter().map(|(k, v)| (*k, v.clone())).collect()
        };
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        for (key, data) in entries {
            let node = decode_node(&key, &data)?;
            visitor(&key, &node)?;
        }
        Ok(())
    }

    fn size(&self) -> usize {
        self.len()
    }
}
