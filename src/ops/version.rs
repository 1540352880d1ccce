//! Version bumps over a whole trie

use super::Cancellation;
use crate::model::{Key, Sequence};
use crate::trie::{MerklePatriciaTrie, Node, NodeTypes, Visit};
use crate::Result;
use log::{debug, info};
use serde::Serialize;
use std::collections::HashSet;

/// Counters from a version bump or a prune
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PruneStats {
    /// The version nodes were raised to, or pruned below
    pub origin: Sequence,
    /// Nodes found with an older origin
    pub below_origin: usize,
    /// `multi_put_node` / `multi_delete_node` calls made
    pub batches: usize,
    pub deleted: usize,
}

impl MerklePatriciaTrie {
    /// Raise the origin of every reachable node below `version` to `version`
    ///
    /// Nodes already at or above `version` keep their origin. A node shared
    /// by several paths is rewritten and counted once. Rewritten nodes
    /// are flushed in batches; if the scan is cancelled or fails, the batches
    /// already written stay.
    pub fn update_version(&self, version: Sequence, cancel: &Cancellation) -> Result<PruneStats> {
        let store = self.store().clone();
        let batch_size = self.batch_size();
        let trace = self.trace_state();

        let mut stats = PruneStats {
            origin: version,
            ..Default::default()
        };
        let mut keys: Vec<Key> = Vec::with_capacity(batch_size);
        let mut nodes: Vec<Node> = Vec::with_capacity(batch_size);
        let mut seen: HashSet<Key> = HashSet::new();

        self.iterate(
            cancel,
            |_, key, visit| {
                let (Some(key), Visit::Node(node)) = (key, visit) else {
                    return Ok(());
                };
                if node.origin() >= version || !seen.insert(*key) {
                    return Ok(());
                }
                if trace {
                    debug!(
                        "bump {} from {} to {}",
                        key.short(),
                        node.origin(),
                        version
                    );
                }

                keys.push(*key);
                nodes.push(node.clone().with_origin(version));
                stats.below_origin += 1;

                if keys.len() >= batch_size {
                    store.multi_put_node(&keys, &nodes)?;
                    stats.batches += 1;
                    keys.clear();
                    nodes.clear();
                }
                Ok(())
            },
            NodeTypes::ALL_NODES,
        )?;

        if !keys.is_empty() {
            store.multi_put_node(&keys, &nodes)?;
            stats.batches += 1;
        }

        info!(
            "updated {} nodes to version {} in {} batches",
            stats.below_origin, version, stats.batches
        );
        Ok(stats)
    }
}
