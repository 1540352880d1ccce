//! Ledger of node replacements for one edit session

use super::Node;
use crate::model::{Key, Sequence, ValueNode};
use crate::store::NodeStore;
use crate::{Result, DEFAULT_BATCH_SIZE};
use log::debug;
use std::collections::{BTreeMap, HashSet};

/// A node written during the session and the stored node it replaced, if any
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeChange {
    pub old: Option<Node>,
    pub new: Node,
}

/// Tracks every node a sequence of inserts and deletes touched
///
/// Replacement chains are folded so only the first and last node of a chain
/// are kept: writing A, then B over A, then C over B records A -> C and
/// schedules A for deletion. Keyed maps keep flushes in a stable order.
#[derive(Clone, Debug)]
pub struct ChangeCollector {
    changes: BTreeMap<Key, NodeChange>,
    deletes: BTreeMap<Key, Node>,
    deleted_values: BTreeMap<Key, ValueNode>,
    batch_size: usize,
}

impl Default for ChangeCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeCollector {
    pub fn new() -> Self {
        Self::with_batch_size(DEFAULT_BATCH_SIZE)
    }

    pub fn with_batch_size(batch_size: usize) -> Self {
        ChangeCollector {
            changes: BTreeMap::new(),
            deletes: BTreeMap::new(),
            deleted_values: BTreeMap::new(),
            batch_size: batch_size.max(1),
        }
    }

    /// Record `new` replacing `old` (or appearing fresh when `old` is `None`)
    pub fn add_change(&mut self, old: Option<&Node>, new: &Node) {
        let new_key = new.hash();
        // A node deleted earlier in the session is live again
        self.deletes.remove(&new_key);

        let Some(old) = old else {
            let prev_old = self.changes.remove(&new_key).and_then(|c| c.old);
            self.changes.insert(
                new_key,
                NodeChange {
                    old: prev_old,
                    new: new.clone(),
                },
            );
            return;
        };

        let old_key = old.hash();
        if old_key == new_key {
            let prev_old = self
                .changes
                .remove(&new_key)
                .map_or_else(|| Some(old.clone()), |c| c.old);
            self.changes.insert(
                new_key,
                NodeChange {
                    old: prev_old,
                    new: new.clone(),
                },
            );
            return;
        }

        match self.changes.remove(&old_key) {
            Some(prev) => {
                if prev.old.as_ref().map(Node::hash) == Some(new_key) {
                    // Back to the node the chain started from
                    return;
                }
                self.changes.insert(
                    new_key,
                    NodeChange {
                        old: prev.old,
                        new: new.clone(),
                    },
                );
            }
            None => {
                self.changes.insert(
                    new_key,
                    NodeChange {
                        old: Some(old.clone()),
                        new: new.clone(),
                    },
                );
                self.deletes.insert(old_key, old.clone());
            }
        }
    }

    /// Record that `old` was removed outright
    pub fn delete_change(&mut self, old: &Node) {
        let old_key = old.hash();
        match self.changes.remove(&old_key) {
            Some(NodeChange {
                old: Some(original),
                ..
            }) if original.hash() == old_key => {
                self.deletes.insert(old_key, original);
            }
            Some(_) => {}
            None => {
                self.deletes.insert(old_key, old.clone());
            }
        }
    }

    /// Record a value that left the trie
    pub fn delete_value(&mut self, value: &ValueNode) {
        self.deleted_values.insert(value.hash(), value.clone());
    }

    pub fn changes(&self) -> impl Iterator<Item = &NodeChange> {
        self.changes.values()
    }

    pub fn deletes(&self) -> impl Iterator<Item = &Node> {
        self.deletes.values()
    }

    pub fn deleted_values(&self) -> impl Iterator<Item = &ValueNode> {
        self.deleted_values.values()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.deletes.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Write every new node to `store` stamped with `version`, then remove
    /// superseded nodes if `include_deletes` is set
    ///
    /// Keys in `live` are never deleted. Identical nodes share a key, so a
    /// node superseded on one path may still hang off another; pass the keys
    /// reachable from the session's root.
    pub fn update_changes(
        &self,
        store: &dyn NodeStore,
        version: Sequence,
        include_deletes: bool,
        live: &HashSet<Key>,
    ) -> Result<()> {
        let (keys, nodes): (Vec<Key>, Vec<Node>) = self
            .changes
            .iter()
            .map(|(key, change)| (*key, change.new.clone().with_origin(version)))
            .unzip();

        for (keys, nodes) in keys
            .chunks(self.batch_size)
            .zip(nodes.chunks(self.batch_size))
        {
            store.multi_put_node(keys, nodes)?;
        }

        if include_deletes {
            let deletes: Vec<Key> = self
                .deletes
                .keys()
                .filter(|k| !self.changes.contains_key(*k) && !live.contains(*k))
                .copied()
                .collect();
            for keys in deletes.chunks(self.batch_size) {
                store.multi_delete_node(keys)?;
            }
            debug!(
                "saved {} changes and {} deletes at version {}",
                self.changes.len(),
                deletes.len(),
                version
            );
        } else {
            debug!(
                "saved {} changes at version {}",
                self.changes.len(),
                version
            );
        }
        Ok(())
    }
}
