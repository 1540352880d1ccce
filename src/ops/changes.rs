//! Rebuilding per-version change sets from a store

use super::Cancellation;
use crate::model::Sequence;
use crate::store::{MemoryNodeStore, NodeStore};
use crate::trie::MerklePatriciaTrie;
use crate::Result;
use log::debug;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Group every stored node with an origin in `start..=end` by origin
///
/// Each version gets its own trie over a fresh memory store holding only the
/// nodes stamped with that version, rooted at the node that reaches most of
/// them. Those tries are partial: nodes they share with older versions are
/// not in their store.
pub fn get_changes(
    store: &dyn NodeStore,
    start: Sequence,
    end: Sequence,
    cancel: &Cancellation,
) -> Result<BTreeMap<Sequence, MerklePatriciaTrie>> {
    let mut layers: BTreeMap<Sequence, Arc<MemoryNodeStore>> = BTreeMap::new();

    store.iterate(&mut |key, node| {
        cancel.check()?;
        let origin = node.origin();
        if origin < start || origin > end {
            return Ok(());
        }
        layers
            .entry(origin)
            .or_insert_with(|| Arc::new(MemoryNodeStore::new()))
            .put_node(key, node)
    })?;

    let mut tries = BTreeMap::new();
    for (origin, layer) in layers {
        let Some(root) = layer.compute_root()? else {
            continue;
        };
        debug!(
            "version {}: {} nodes, root {}",
            origin,
            layer.len(),
            root.short()
        );
        tries.insert(origin, MerklePatriciaTrie::from_root(layer, root, origin));
    }
    Ok(tries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Path;
    use crate::trie::{NodeTypes, Visit};

    fn p(key: &str) -> Path {
        Path::from_bytes(key.as_bytes())
    }

    #[test]
    fn test_changes_grouped_by_version() {
        let persisted = MemoryNodeStore::new();

        let mut trie = MerklePatriciaTrie::new(Arc::new(MemoryNodeStore::new()), 1);
        trie.insert(&p("cat"), &"A".to_string()).unwrap();
        trie.insert(&p("dog"), &"C".to_string()).unwrap();
        trie.save_changes(&persisted, false).unwrap();
        let first_root = trie.root();

        trie.reset_change_collector(None);
        trie.set_version(2);
        trie.insert(&p("car"), &"B".to_string()).unwrap();
        trie.save_changes(&persisted, false).unwrap();
        let second_root = trie.root();

        let changes = get_changes(&persisted, 1, 2, &Cancellation::new()).unwrap();
        assert_eq!(changes.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(changes[&1].root(), first_root);
        assert_eq!(changes[&2].root(), second_root);

        // The dog leaf was written at version 1, so the walk stops there
        let mut leaves = 0;
        changes[&2]
            .iterate(
                &Cancellation::new(),
                |_, _, visit| {
                    if let Visit::Node(node) = visit {
                        assert_eq!(node.origin(), 2);
                        leaves += 1;
                    }
                    Ok(())
                },
                NodeTypes::LEAF,
            )
            .unwrap_err();
        assert_eq!(leaves, 2);

        let only_second = get_changes(&persisted, 2, 2, &Cancellation::new()).unwrap();
        assert_eq!(only_second.len(), 1);
    }

    #[test]
    fn test_changes_cancelled() {
        let persisted = MemoryNodeStore::new();
        let mut trie = MerklePatriciaTrie::new(Arc::new(MemoryNodeStore::new()), 1);
        trie.insert(&p("cat"), &"A".to_string()).unwrap();
        trie.save_changes(&persisted, false).unwrap();

        let cancel = Cancellation::new();
        cancel.cancel();
        assert!(get_changes(&persisted, 0, 10, &cancel).is_err());
    }
}
