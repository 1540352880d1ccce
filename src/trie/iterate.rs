//! Depth-first traversal and the checks built on it

use super::{MerklePatriciaTrie, Node, NodeTypes};
use crate::error::InvariantViolation;
use crate::model::{Key, Path, ValueNode};
use crate::ops::Cancellation;
use crate::Result;
use std::collections::HashSet;
use std::io::Write;

/// What the iteration handler is looking at
#[derive(Clone, Copy, Debug)]
pub enum Visit<'a> {
    Node(&'a Node),
    /// The value carried by the node visited just before
    Value(&'a ValueNode),
}

type Handler<'h> = dyn FnMut(&Path, Option<&Key>, Visit<'_>) -> Result<()> + 'h;

impl MerklePatriciaTrie {
    /// Walk every node reachable from the root
    ///
    /// Nodes whose kind is in `types` are reported with the path leading to
    /// them and their key. Identical subtrees share a key, so a shared node is
    /// reported once for every path that reaches it. With `NodeTypes::VALUE`
    /// set, a node's value follows it, reported under the full path it is
    /// stored at and no key. Full node children are visited in ascending
    /// nibble order. `cancel` is checked before each node and a handler error
    /// stops the walk.
    pub fn iterate<F>(&self, cancel: &Cancellation, mut handler: F, types: NodeTypes) -> Result<()>
    where
        F: FnMut(&Path, Option<&Key>, Visit<'_>) -> Result<()>,
    {
        if self.root().is_zero() {
            return Ok(());
        }
        let mut path = Path::new();
        self.iterate_at(cancel, &mut handler, types, &mut path, self.root())
    }

    fn iterate_at(
        &self,
        cancel: &Cancellation,
        handler: &mut Handler<'_>,
        types: NodeTypes,
        path: &mut Path,
        key: Key,
    ) -> Result<()> {
        cancel.check()?;
        let node = self.load_node(&key)?;

        if types.includes(node.kind().types()) {
            handler(path, Some(&key), Visit::Node(&node))?;
        }
        if types.includes(NodeTypes::VALUE) {
            if let Some(value) = node.value() {
                match &node {
                    Node::Leaf(leaf) => {
                        let full = Path::joined(path.as_slice(), leaf.path.as_slice());
                        handler(&full, None, Visit::Value(value))?;
                    }
                    _ => handler(path, None, Visit::Value(value))?,
                }
            }
        }

        let depth = path.len();
        match &node {
            Node::Leaf(_) => {}
            Node::Full(full) => {
                for (nibble, child) in full.iter_children() {
                    path.push(nibble);
                    self.iterate_at(cancel, handler, types, path, *child)?;
                    path.truncate(depth);
                }
            }
            Node::Extension(ext) => {
                path.extend_from_slice(ext.path.as_slice());
                self.iterate_at(cancel, handler, types, path, ext.child)?;
                path.truncate(depth);
            }
        }
        Ok(())
    }

    /// Distinct keys of every node reachable from the root
    pub fn reachable_keys(&self, cancel: &Cancellation) -> Result<HashSet<Key>> {
        let mut keys = HashSet::new();
        self.iterate(
            cancel,
            |_, key, _| {
                if let Some(key) = key {
                    keys.insert(*key);
                }
                Ok(())
            },
            NodeTypes::ALL_NODES,
        )?;
        Ok(keys)
    }

    /// All stored values keyed by their full path
    pub fn values(&self, cancel: &Cancellation) -> Result<Vec<(Path, ValueNode)>> {
        let mut values = Vec::new();
        self.iterate(
            cancel,
            |path, _, visit| {
                if let Visit::Value(value) = visit {
                    values.push((path.clone(), value.clone()));
                }
                Ok(())
            },
            NodeTypes::VALUE,
        )?;
        Ok(values)
    }

    /// Write an indented dump of the trie, one node per line
    pub fn pretty_print(&self, out: &mut dyn Write) -> Result<()> {
        if self.root().is_zero() {
            writeln!(out, "<empty>")?;
            return Ok(());
        }
        self.pretty_print_at(out, self.root(), 0, None)
    }

    fn pretty_print_at(
        &self,
        out: &mut dyn Write,
        key: Key,
        depth: usize,
        nibble: Option<u8>,
    ) -> Result<()> {
        let node = self.load_node(&key)?;
        let indent = "  ".repeat(depth);
        let slot = nibble.map(|n| format!("{:02} ", n)).unwrap_or_default();

        match &node {
            Node::Leaf(leaf) => {
                let value = leaf
                    .value
                    .as_ref()
                    .map(|v| hex::encode(v.bytes()))
                    .unwrap_or_default();
                writeln!(
                    out,
                    "{indent}{slot}L:{} path={} value={} origin={}",
                    key.short(),
                    leaf.path,
                    value,
                    leaf.origin
                )?;
            }
            Node::Extension(ext) => {
                writeln!(
                    out,
                    "{indent}{slot}E:{} path={} origin={}",
                    key.short(),
                    ext.path,
                    ext.origin
                )?;
                self.pretty_print_at(out, ext.child, depth + 1, None)?;
            }
            Node::Full(full) => {
                let value = full
                    .value
                    .as_ref()
                    .map(|v| format!(" value={}", hex::encode(v.bytes())))
                    .unwrap_or_default();
                writeln!(
                    out,
                    "{indent}{slot}F:{}{} origin={}",
                    key.short(),
                    value,
                    full.origin
                )?;
                for (n, child) in full.iter_children() {
                    self.pretty_print_at(out, *child, depth + 1, Some(n))?;
                }
            }
        }
        Ok(())
    }

    /// Check every reachable node against the structural invariants
    ///
    /// Each node must hash to the key it is stored under, full nodes must
    /// hold either two children or one child and a value, and extensions must
    /// have a non-empty path and a full node below them.
    pub fn validate(&self, cancel: &Cancellation) -> Result<()> {
        let root = self.root();
        self.iterate(
            cancel,
            |_, key, visit| {
                let (Some(key), Visit::Node(node)) = (key, visit) else {
                    return Ok(());
                };

                let actual = node.hash();
                if actual != *key {
                    if *key == root {
                        return Err(InvariantViolation::RootMismatch {
                            expected: *key,
                            actual,
                        }
                        .into());
                    }
                    return Err(structure(*key, format!("node hashes to {}", actual)));
                }

                match node {
                    Node::Leaf(leaf) => {
                        if !leaf.path.is_well_formed() {
                            return Err(structure(*key, "leaf path holds a non-nibble"));
                        }
                        if leaf.value.is_none() {
                            return Err(structure(*key, "leaf without a value"));
                        }
                    }
                    Node::Extension(ext) => {
                        if ext.path.is_empty() {
                            return Err(structure(*key, "extension with an empty path"));
                        }
                        if !ext.path.is_well_formed() {
                            return Err(structure(*key, "extension path holds a non-nibble"));
                        }
                        if !matches!(self.load_node(&ext.child)?, Node::Full(_)) {
                            return Err(structure(*key, "extension child is not a full node"));
                        }
                    }
                    Node::Full(full) => {
                        let children = full.num_children();
                        if children == 0 || (children == 1 && !full.has_value()) {
                            return Err(structure(
                                *key,
                                format!(
                                    "full node with {} children and {} value",
                                    children,
                                    if full.has_value() { "a" } else { "no" }
                                ),
                            ));
                        }
                    }
                }
                Ok(())
            },
            NodeTypes::ALL_NODES,
        )
    }
}

fn structure(key: Key, detail: impl Into<String>) -> crate::Error {
    InvariantViolation::Structure {
        key,
        detail: detail.into(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sequence;
    use crate::store::{MemoryNodeStore, NodeStore};
    use crate::trie::{FullNode, LeafNode, NodeKind};
    use crate::Error;
    use std::sync::Arc;

    fn p(key: &str) -> Path {
        Path::from_bytes(key.as_bytes())
    }

    fn sample(version: Sequence) -> MerklePatriciaTrie {
        let mut trie = MerklePatriciaTrie::new(Arc::new(MemoryNodeStore::new()), version);
        for (k, v) in [("cat", "A"), ("car", "B"), ("dog", "C")] {
            trie.insert(&p(k), &v.to_string()).unwrap();
        }
        trie
    }

    #[test]
    fn test_iterate_visits_nodes_and_values() {
        let trie = sample(1);
        let mut kinds = Vec::new();
        let mut values = Vec::new();
        trie.iterate(
            &Cancellation::new(),
            |path, key, visit| {
                match visit {
                    Visit::Node(node) => {
                        assert!(key.is_some());
                        kinds.push(node.kind());
                    }
                    Visit::Value(value) => {
                        assert!(key.is_none());
                        values.push((path.to_bytes().unwrap(), value.bytes().to_vec()));
                    }
                }
                Ok(())
            },
            NodeTypes::ALL,
        )
        .unwrap();

        assert_eq!(
            kinds,
            vec![
                NodeKind::Extension,
                NodeKind::Full,
                NodeKind::Extension,
                NodeKind::Full,
                NodeKind::Leaf,
                NodeKind::Leaf,
                NodeKind::Leaf,
            ]
        );
        assert_eq!(
            values,
            vec![
                (b"car".to_vec(), b"B".to_vec()),
                (b"cat".to_vec(), b"A".to_vec()),
                (b"dog".to_vec(), b"C".to_vec()),
            ]
        );
    }

    #[test]
    fn test_iterate_filters_by_type() {
        let trie = sample(1);
        let mut leaves = 0;
        trie.iterate(
            &Cancellation::new(),
            |_, _, visit| {
                assert!(matches!(visit, Visit::Node(n) if n.kind() == NodeKind::Leaf));
                leaves += 1;
                Ok(())
            },
            NodeTypes::LEAF,
        )
        .unwrap();
        assert_eq!(leaves, 3);
    }

    #[test]
    fn test_iterate_handler_error_stops_walk() {
        let trie = sample(1);
        let mut seen = 0;
        let result = trie.iterate(
            &Cancellation::new(),
            |_, _, _| {
                seen += 1;
                Err(Error::Cancelled)
            },
            NodeTypes::ALL_NODES,
        );
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_iterate_cancelled() {
        let trie = sample(1);
        let cancel = Cancellation::new();
        cancel.cancel();
        let result = trie.iterate(&cancel, |_, _, _| Ok(()), NodeTypes::ALL);
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_shared_leaf_is_one_reachable_key() {
        let mut trie = MerklePatriciaTrie::new(Arc::new(MemoryNodeStore::new()), 1);
        for nibbles in [[0, 1, 1], [1, 1, 1]] {
            let path = Path::from_nibbles(nibbles).unwrap();
            trie.insert(&path, &"v".to_string()).unwrap();
        }

        // root full node, then the same leaf under nibbles 0 and 1
        let mut visits = 0;
        trie.iterate(
            &Cancellation::new(),
            |_, _, _| {
                visits += 1;
                Ok(())
            },
            NodeTypes::ALL_NODES,
        )
        .unwrap();
        assert_eq!(visits, 3);
        assert_eq!(trie.reachable_keys(&Cancellation::new()).unwrap().len(), 2);
    }

    #[test]
    fn test_pretty_print() {
        let trie = sample(3);
        let mut out = Vec::new();
        trie.pretty_print(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 7);
        assert!(lines[0].starts_with("E:"));
        assert!(lines[1].starts_with("  F:"));
        assert!(lines[2].starts_with("    03 E:"));
        assert!(lines.iter().all(|l| l.ends_with("origin=3")));
    }

    #[test]
    fn test_validate_accepts_built_trie() {
        let mut trie = sample(1);
        trie.validate(&Cancellation::new()).unwrap();
        trie.delete(&p("cat")).unwrap();
        trie.validate(&Cancellation::new()).unwrap();
    }

    #[test]
    fn test_validate_rejects_lone_child_branch() {
        let store = Arc::new(MemoryNodeStore::new());
        let leaf: Node = LeafNode::new(p("a"), 1, Some(ValueNode::new(b"v".to_vec()))).into();
        let mut full = FullNode::new(None, 1);
        full.put_child(4, Some(leaf.hash()));
        let full: Node = full.into();
        store.put_node(&leaf.hash(), &leaf).unwrap();
        store.put_node(&full.hash(), &full).unwrap();

        let trie = MerklePatriciaTrie::from_root(store, full.hash(), 1);
        let err = trie.validate(&Cancellation::new()).unwrap_err();
        assert!(err.is_invariant_violation());
    }
}
