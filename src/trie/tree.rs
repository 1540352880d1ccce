//! Merkle patricia trie over a content-addressed node store

use super::{ChangeCollector, ExtensionNode, FullNode, LeafNode, Node};
use crate::config::TrieConfig;
use crate::model::{matching_prefix_len, Key, Path, Sequence, Serializable, ValueNode};
use crate::ops::Cancellation;
use crate::store::NodeStore;
use crate::{Error, Result};
use log::debug;
use std::collections::HashSet;
use std::sync::Arc;

/// A merkle patricia trie
///
/// Every edit writes new nodes straight into the store and records the
/// replacement in the change collector; existing nodes are never touched.
/// The root is `Key::ZERO` while the trie is empty.
pub struct MerklePatriciaTrie {
    root: Key,
    store: Arc<dyn NodeStore>,
    change_collector: ChangeCollector,
    version: Sequence,
    batch_size: usize,
    trace_state: bool,
}

impl MerklePatriciaTrie {
    /// Create an empty trie stamping new nodes with `version`
    pub fn new(store: Arc<dyn NodeStore>, version: Sequence) -> Self {
        Self::with_config(store, version, &TrieConfig::default())
    }

    pub fn with_config(store: Arc<dyn NodeStore>, version: Sequence, config: &TrieConfig) -> Self {
        MerklePatriciaTrie {
            root: Key::ZERO,
            store,
            change_collector: ChangeCollector::with_batch_size(config.batch_size),
            version,
            batch_size: config.batch_size.max(1),
            trace_state: config.trace_state,
        }
    }

    /// Open an existing root
    pub fn from_root(store: Arc<dyn NodeStore>, root: Key, version: Sequence) -> Self {
        let mut trie = Self::new(store, version);
        trie.root = root;
        trie
    }

    pub fn root(&self) -> Key {
        self.root
    }

    pub fn set_root(&mut self, root: Key) {
        self.root = root;
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_zero()
    }

    pub fn version(&self) -> Sequence {
        self.version
    }

    pub fn set_version(&mut self, version: Sequence) {
        self.version = version;
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub(crate) fn trace_state(&self) -> bool {
        self.trace_state
    }

    pub fn store(&self) -> &Arc<dyn NodeStore> {
        &self.store
    }

    /// Point the trie at another store. Pending changes are dropped.
    pub fn set_node_store(&mut self, store: Arc<dyn NodeStore>) {
        self.store = store;
        self.change_collector = ChangeCollector::with_batch_size(self.batch_size);
    }

    pub fn change_collector(&self) -> &ChangeCollector {
        &self.change_collector
    }

    /// Start a new edit session, optionally from another root
    pub fn reset_change_collector(&mut self, root: Option<Key>) {
        if let Some(root) = root {
            self.root = root;
        }
        self.change_collector = ChangeCollector::with_batch_size(self.batch_size);
    }

    /// Flush the session's changes into `store`, stamped with this trie's version
    ///
    /// With `include_deletes`, superseded nodes are removed unless the current
    /// root still reaches them.
    pub fn save_changes(&self, store: &dyn NodeStore, include_deletes: bool) -> Result<()> {
        let live = if include_deletes {
            self.reachable_keys(&Cancellation::new())?
        } else {
            HashSet::new()
        };
        self.change_collector
            .update_changes(store, self.version, include_deletes, &live)
    }

    /// The value stored at `path`
    pub fn get_node_value(&self, path: &Path) -> Result<ValueNode> {
        if self.root.is_zero() {
            return Err(Error::ValueNotPresent);
        }

        let mut key = self.root;
        let mut rest = path.as_slice();
        loop {
            match self.load_node(&key)? {
                Node::Leaf(leaf) => {
                    if leaf.path.as_slice() != rest {
                        return Err(Error::ValueNotPresent);
                    }
                    return leaf.value.ok_or(Error::ValueNotPresent);
                }
                Node::Full(full) => {
                    if rest.is_empty() {
                        return full.value.ok_or(Error::ValueNotPresent);
                    }
                    key = *full.child(rest[0]).ok_or(Error::ValueNotPresent)?;
                    rest = &rest[1..];
                }
                Node::Extension(ext) => {
                    if !rest.starts_with(ext.path.as_slice()) {
                        return Err(Error::ValueNotPresent);
                    }
                    rest = &rest[ext.path.len()..];
                    key = ext.child;
                }
            }
        }
    }

    /// Decode the value at `path`, or `None` if nothing is stored there
    pub fn get<T: Serializable>(&self, path: &Path) -> Result<Option<T>> {
        match self.get_node_value(path) {
            Ok(value) => value.decode().map(Some),
            Err(Error::ValueNotPresent) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// The nodes from the root down to the one holding the value at `path`
    pub fn get_path_nodes(&self, path: &Path) -> Result<Vec<Node>> {
        if self.root.is_zero() {
            return Err(Error::ValueNotPresent);
        }

        let mut nodes = Vec::new();
        let mut key = self.root;
        let mut rest = path.as_slice();
        loop {
            let node = self.load_node(&key)?;
            let next = match &node {
                Node::Leaf(leaf) if leaf.path.as_slice() == rest && leaf.value.is_some() => None,
                Node::Full(full) if rest.is_empty() && full.has_value() => None,
                Node::Full(full) if !rest.is_empty() => {
                    let child = *full.child(rest[0]).ok_or(Error::ValueNotPresent)?;
                    rest = &rest[1..];
                    Some(child)
                }
                Node::Extension(ext) if rest.starts_with(ext.path.as_slice()) => {
                    rest = &rest[ext.path.len()..];
                    Some(ext.child)
                }
                _ => return Err(Error::ValueNotPresent),
            };
            nodes.push(node);
            match next {
                Some(child) => key = child,
                None => return Ok(nodes),
            }
        }
    }

    /// Store `value` at `path` and return the new root
    ///
    /// A value encoding to no bytes deletes the path instead. Deleting a path
    /// that holds nothing this way leaves the trie as it was.
    pub fn insert(&mut self, path: &Path, value: &impl Serializable) -> Result<Key> {
        self.insert_raw(path, value.encode())
    }

    pub fn insert_raw(&mut self, path: &Path, value: Vec<u8>) -> Result<Key> {
        if value.is_empty() {
            return match self.delete(path) {
                Err(Error::ValueNotPresent) => Ok(self.root),
                other => other,
            };
        }

        let value = ValueNode::new(value);
        let root = (!self.root.is_zero()).then_some(self.root);
        self.root = self.insert_at(root, path.as_slice(), &value)?;
        Ok(self.root)
    }

    /// Remove the value at `path` and return the new root
    ///
    /// Fails with `ValueNotPresent` when no value is stored there, leaving the
    /// trie and its pending changes untouched.
    pub fn delete(&mut self, path: &Path) -> Result<Key> {
        if self.root.is_zero() {
            return Err(Error::ValueNotPresent);
        }
        self.root = match self.delete_at(self.root, path.as_slice())? {
            Some((key, _)) => key,
            None => Key::ZERO,
        };
        Ok(self.root)
    }

    pub(crate) fn load_node(&self, key: &Key) -> Result<Node> {
        let result = self.store.get_node(key);
        if self.trace_state {
            if let Err(Error::NodeNotFound(_)) = &result {
                debug!("node {} not found under root {}", key.short(), self.root.short());
            }
        }
        result
    }

    fn insert_node(&mut self, old: Option<&Node>, new: Node) -> Result<Key> {
        self.change_collector.add_change(old, &new);
        let key = new.hash();
        self.store.put_node(&key, &new)?;
        Ok(key)
    }

    fn new_leaf(&mut self, path: &[u8], value: Option<ValueNode>) -> Result<Key> {
        let leaf = LeafNode::new(Path::from_slice_unchecked(path), self.version, value);
        self.insert_node(None, leaf.into())
    }

    /// Put `full` in place of `old`, behind an extension when `prefix` is non-empty
    fn branch_with_prefix(&mut self, old: &Node, prefix: &[u8], full: FullNode) -> Result<Key> {
        if prefix.is_empty() {
            return self.insert_node(Some(old), full.into());
        }
        let child = self.insert_node(None, full.into())?;
        let ext = ExtensionNode::new(Path::from_slice_unchecked(prefix), child, self.version);
        self.insert_node(Some(old), ext.into())
    }

    fn insert_at(&mut self, key: Option<Key>, path: &[u8], value: &ValueNode) -> Result<Key> {
        let Some(key) = key else {
            return self.new_leaf(path, Some(value.clone()));
        };

        let node = self.load_node(&key)?;
        if path.is_empty() {
            return self.insert_here(&node, value);
        }

        match &node {
            Node::Full(full) => {
                let nibble = path[0];
                let child = self.insert_at(full.child(nibble).copied(), &path[1..], value)?;
                let mut updated = full.clone();
                updated.put_child(nibble, Some(child));
                updated.origin = self.version;
                self.insert_node(Some(&node), updated.into())
            }
            Node::Leaf(leaf) => self.insert_at_leaf(&node, leaf, path, value),
            Node::Extension(ext) => self.insert_at_extension(&node, ext, path, value),
        }
    }

    /// Insert where the remaining path is used up
    fn insert_here(&mut self, node: &Node, value: &ValueNode) -> Result<Key> {
        let updated: Node = match node {
            Node::Full(full) => {
                let mut updated = full.clone();
                updated.value = Some(value.clone());
                updated.origin = self.version;
                updated.into()
            }
            Node::Leaf(leaf) if leaf.path.is_empty() => {
                LeafNode::new(Path::new(), self.version, Some(value.clone())).into()
            }
            Node::Leaf(leaf) => {
                let lpath = leaf.path.as_slice();
                let mut full = FullNode::new(Some(value.clone()), self.version);
                let child = self.new_leaf(&lpath[1..], leaf.value.clone())?;
                full.put_child(lpath[0], Some(child));
                full.into()
            }
            Node::Extension(ext) => {
                let epath = ext.path.as_slice();
                let mut full = FullNode::new(Some(value.clone()), self.version);
                let child = if epath.len() == 1 {
                    ext.child
                } else {
                    let rest = ExtensionNode::new(
                        Path::from_slice_unchecked(&epath[1..]),
                        ext.child,
                        self.version,
                    );
                    self.insert_node(None, rest.into())?
                };
                full.put_child(epath[0], Some(child));
                full.into()
            }
        };
        self.insert_node(Some(node), updated)
    }

    fn insert_at_leaf(
        &mut self,
        node: &Node,
        leaf: &LeafNode,
        path: &[u8],
        value: &ValueNode,
    ) -> Result<Key> {
        let lpath = leaf.path.as_slice();
        if lpath == path {
            let updated = LeafNode::new(leaf.path.clone(), self.version, Some(value.clone()));
            return self.insert_node(Some(node), updated.into());
        }

        let plen = matching_prefix_len(path, lpath);
        let mut full = FullNode::new(None, self.version);

        if plen == lpath.len() {
            full.value = leaf.value.clone();
        } else {
            let child = self.new_leaf(&lpath[plen + 1..], leaf.value.clone())?;
            full.put_child(lpath[plen], Some(child));
        }

        if plen == path.len() {
            full.value = Some(value.clone());
        } else {
            let child = self.new_leaf(&path[plen + 1..], Some(value.clone()))?;
            full.put_child(path[plen], Some(child));
        }

        self.branch_with_prefix(node, &path[..plen], full)
    }

    fn insert_at_extension(
        &mut self,
        node: &Node,
        ext: &ExtensionNode,
        path: &[u8],
        value: &ValueNode,
    ) -> Result<Key> {
        let epath = ext.path.as_slice();
        let plen = matching_prefix_len(path, epath);

        if plen == epath.len() {
            let child = self.insert_at(Some(ext.child), &path[plen..], value)?;
            let updated = ExtensionNode::new(ext.path.clone(), child, self.version);
            return self.insert_node(Some(node), updated.into());
        }

        let mut full = FullNode::new(None, self.version);
        let rest = &epath[plen + 1..];
        let branch = if rest.is_empty() {
            ext.child
        } else {
            let rest = ExtensionNode::new(Path::from_slice_unchecked(rest), ext.child, self.version);
            self.insert_node(None, rest.into())?
        };
        full.put_child(epath[plen], Some(branch));

        if plen == path.len() {
            full.value = Some(value.clone());
        } else {
            let child = self.new_leaf(&path[plen + 1..], Some(value.clone()))?;
            full.put_child(path[plen], Some(child));
        }

        self.branch_with_prefix(node, &path[..plen], full)
    }

    /// Delete below `key`, returning what replaces it (`None` when the
    /// subtree is gone)
    fn delete_at(&mut self, key: Key, path: &[u8]) -> Result<Option<(Key, Node)>> {
        let node = self.load_node(&key)?;
        match &node {
            Node::Leaf(leaf) => {
                if leaf.path.as_slice() != path {
                    return Err(Error::ValueNotPresent);
                }
                let Some(value) = &leaf.value else {
                    return Err(Error::ValueNotPresent);
                };
                self.change_collector.delete_value(value);
                self.change_collector.delete_change(&node);
                Ok(None)
            }
            Node::Extension(ext) => {
                if !path.starts_with(ext.path.as_slice()) {
                    return Err(Error::ValueNotPresent);
                }
                let child = self.delete_at(ext.child, &path[ext.path.len()..])?;
                self.reattach_extension(&node, ext, child)
            }
            Node::Full(full) => {
                let mut updated = full.clone();
                updated.origin = self.version;
                if path.is_empty() {
                    let Some(value) = updated.value.take() else {
                        return Err(Error::ValueNotPresent);
                    };
                    self.change_collector.delete_value(&value);
                } else {
                    let nibble = path[0];
                    let child = *full.child(nibble).ok_or(Error::ValueNotPresent)?;
                    let child = self.delete_at(child, &path[1..])?;
                    updated.put_child(nibble, child.map(|(k, _)| k));
                }
                self.normalize_full(&node, updated)
            }
        }
    }

    fn keep(&mut self, old: Option<&Node>, new: Node) -> Result<Option<(Key, Node)>> {
        let key = self.insert_node(old, new.clone())?;
        Ok(Some((key, new)))
    }

    /// Replace `old` by `merged`, which absorbs `child`
    fn absorb(&mut self, old: &Node, child: &Node, merged: Node) -> Result<Option<(Key, Node)>> {
        let result = self.keep(Some(child), merged)?;
        self.change_collector.delete_change(old);
        Ok(result)
    }

    /// Rebuild an extension after its child changed
    fn reattach_extension(
        &mut self,
        node: &Node,
        ext: &ExtensionNode,
        child: Option<(Key, Node)>,
    ) -> Result<Option<(Key, Node)>> {
        let Some((child_key, child)) = child else {
            self.change_collector.delete_change(node);
            return Ok(None);
        };

        match &child {
            Node::Leaf(leaf) => {
                let path = Path::joined(ext.path.as_slice(), leaf.path.as_slice());
                let merged = LeafNode::new(path, self.version, leaf.value.clone());
                self.absorb(node, &child, merged.into())
            }
            Node::Extension(inner) => {
                let path = Path::joined(ext.path.as_slice(), inner.path.as_slice());
                let merged = ExtensionNode::new(path, inner.child, self.version);
                self.absorb(node, &child, merged.into())
            }
            Node::Full(_) => {
                let updated = ExtensionNode::new(ext.path.clone(), child_key, self.version);
                self.keep(Some(node), updated.into())
            }
        }
    }

    /// Collapse a full node left over by a delete into its canonical shape
    fn normalize_full(&mut self, old: &Node, full: FullNode) -> Result<Option<(Key, Node)>> {
        match (full.num_children(), full.has_value()) {
            (0, false) => {
                self.change_collector.delete_change(old);
                Ok(None)
            }
            (0, true) => {
                let leaf = LeafNode::new(Path::new(), self.version, full.value);
                self.keep(Some(old), leaf.into())
            }
            (1, false) => {
                let Some((nibble, child_key)) = full.iter_children().next().map(|(n, k)| (n, *k))
                else {
                    return Ok(None);
                };
                let child = self.load_node(&child_key)?;
                match &child {
                    Node::Full(_) => {
                        let ext = ExtensionNode::new(
                            Path::from_slice_unchecked(&[nibble]),
                            child_key,
                            self.version,
                        );
                        self.keep(Some(old), ext.into())
                    }
                    Node::Leaf(leaf) => {
                        let path = Path::joined(&[nibble], leaf.path.as_slice());
                        let merged = LeafNode::new(path, self.version, leaf.value.clone());
                        self.absorb(old, &child, merged.into())
                    }
                    Node::Extension(inner) => {
                        let path = Path::joined(&[nibble], inner.path.as_slice());
                        let merged = ExtensionNode::new(path, inner.child, self.version);
                        self.absorb(old, &child, merged.into())
                    }
                }
            }
            _ => self.keep(Some(old), full.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryNodeStore;
    use crate::trie::NodeKind;

    fn trie() -> MerklePatriciaTrie {
        MerklePatriciaTrie::new(Arc::new(MemoryNodeStore::new()), 1)
    }

    fn p(key: &str) -> Path {
        Path::from_bytes(key.as_bytes())
    }

    fn get(trie: &MerklePatriciaTrie, key: &str) -> Option<String> {
        trie.get::<String>(&p(key)).unwrap()
    }

    #[test]
    fn test_empty_trie() {
        let trie = trie();
        assert!(trie.is_empty());
        assert!(matches!(
            trie.get_node_value(&p("cat")),
            Err(Error::ValueNotPresent)
        ));
    }

    #[test]
    fn test_single_insert_is_leaf() {
        let mut trie = trie();
        let root = trie.insert(&p("cat"), &"A".to_string()).unwrap();

        let node = trie.store().get_node(&root).unwrap();
        assert_eq!(node.kind(), NodeKind::Leaf);
        assert_eq!(get(&trie, "cat").as_deref(), Some("A"));
    }

    #[test]
    fn test_cat_car_dog() {
        let mut trie = trie();
        trie.insert(&p("cat"), &"A".to_string()).unwrap();
        trie.insert(&p("car"), &"B".to_string()).unwrap();
        trie.insert(&p("dog"), &"C".to_string()).unwrap();

        assert_eq!(get(&trie, "cat").as_deref(), Some("A"));
        assert_eq!(get(&trie, "car").as_deref(), Some("B"));
        assert_eq!(get(&trie, "dog").as_deref(), Some("C"));
        assert_eq!(get(&trie, "ca"), None);

        // "c" and "d" share the high nibble 6
        let root = trie.store().get_node(&trie.root()).unwrap();
        let Node::Extension(ext) = root else {
            panic!("expected extension root, got {:?}", root.kind());
        };
        assert_eq!(ext.path.as_slice(), &[6]);

        let nodes = trie.get_path_nodes(&p("cat")).unwrap();
        let kinds: Vec<NodeKind> = nodes.iter().map(Node::kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Extension,
                NodeKind::Full,
                NodeKind::Extension,
                NodeKind::Full,
                NodeKind::Leaf
            ]
        );
    }

    #[test]
    fn test_delete_collapses_to_leaf() {
        let mut trie = trie();
        for (k, v) in [("cat", "A"), ("car", "B"), ("dog", "C")] {
            trie.insert(&p(k), &v.to_string()).unwrap();
        }
        trie.delete(&p("cat")).unwrap();

        assert_eq!(get(&trie, "cat"), None);
        assert_eq!(get(&trie, "car").as_deref(), Some("B"));

        let nodes = trie.get_path_nodes(&p("car")).unwrap();
        let Some(Node::Leaf(leaf)) = nodes.last() else {
            panic!("expected leaf");
        };
        assert_eq!(leaf.path.to_hex(), "6172");
        assert_eq!(nodes.len(), 3);

        let mut fresh = self::trie();
        fresh.insert(&p("dog"), &"C".to_string()).unwrap();
        fresh.insert(&p("car"), &"B".to_string()).unwrap();
        assert_eq!(trie.root(), fresh.root());
    }

    #[test]
    fn test_delete_missing_leaves_trie_untouched() {
        let mut trie = trie();
        trie.insert(&p("cat"), &"A".to_string()).unwrap();
        trie.insert(&p("car"), &"B".to_string()).unwrap();
        let root = trie.root();
        let pending = trie.change_collector().len();

        for key in ["ca", "cab", "cart", "dog", ""] {
            assert!(matches!(trie.delete(&p(key)), Err(Error::ValueNotPresent)));
        }
        assert_eq!(trie.root(), root);
        assert_eq!(trie.change_collector().len(), pending);
    }

    #[test]
    fn test_empty_value_deletes() {
        let mut trie = trie();
        trie.insert(&p("cat"), &"A".to_string()).unwrap();
        let root = trie.insert(&p("dog"), &"B".to_string()).unwrap();

        assert_eq!(trie.insert_raw(&p("cow"), Vec::new()).unwrap(), root);
        trie.insert(&p("dog"), &String::new()).unwrap();
        assert_eq!(get(&trie, "dog"), None);

        trie.insert_raw(&p("cat"), Vec::new()).unwrap();
        assert!(trie.is_empty());
    }

    #[test]
    fn test_value_on_full_node() {
        let mut trie = trie();
        trie.insert(&p("ab"), &"long".to_string()).unwrap();
        trie.insert(&p("a"), &"short".to_string()).unwrap();
        trie.insert(&p("ac"), &"other".to_string()).unwrap();

        assert_eq!(get(&trie, "a").as_deref(), Some("short"));
        assert_eq!(get(&trie, "ab").as_deref(), Some("long"));

        // Dropping the branch value leaves two children in place
        trie.delete(&p("a")).unwrap();
        assert_eq!(get(&trie, "a"), None);
        assert_eq!(get(&trie, "ac").as_deref(), Some("other"));

        trie.delete(&p("ac")).unwrap();
        let mut fresh = self::trie();
        fresh.insert(&p("ab"), &"long".to_string()).unwrap();
        assert_eq!(trie.root(), fresh.root());
    }

    #[test]
    fn test_removing_branch_value_with_one_child_collapses() {
        let mut trie = trie();
        trie.insert(&p("a"), &"short".to_string()).unwrap();
        trie.insert(&p("ab"), &"long".to_string()).unwrap();
        trie.delete(&p("a")).unwrap();

        let mut fresh = self::trie();
        fresh.insert(&p("ab"), &"long".to_string()).unwrap();
        assert_eq!(trie.root(), fresh.root());
    }

    #[test]
    fn test_empty_path() {
        let mut trie = trie();
        trie.insert(&Path::new(), &"root".to_string()).unwrap();
        trie.insert(&p("x"), &"x".to_string()).unwrap();

        assert_eq!(trie.get::<String>(&Path::new()).unwrap().as_deref(), Some("root"));
        trie.delete(&Path::new()).unwrap();
        assert_eq!(get(&trie, "x").as_deref(), Some("x"));

        let mut fresh = self::trie();
        fresh.insert(&p("x"), &"x".to_string()).unwrap();
        assert_eq!(trie.root(), fresh.root());
    }

    #[test]
    fn test_idempotent_insert() {
        let mut trie = trie();
        trie.insert(&p("cat"), &"A".to_string()).unwrap();
        let once = trie.insert(&p("car"), &"B".to_string()).unwrap();
        let twice = trie.insert(&p("car"), &"B".to_string()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_update_replaces_value() {
        let mut trie = trie();
        trie.insert(&p("cat"), &"A".to_string()).unwrap();
        trie.insert(&p("car"), &"B".to_string()).unwrap();
        trie.insert(&p("cat"), &"Z".to_string()).unwrap();
        assert_eq!(get(&trie, "cat").as_deref(), Some("Z"));
        assert_eq!(get(&trie, "car").as_deref(), Some("B"));
    }

    #[test]
    fn test_missing_node_is_not_value_not_present() {
        let store = Arc::new(MemoryNodeStore::new());
        let mut trie = MerklePatriciaTrie::new(store.clone(), 1);
        trie.insert(&p("cat"), &"A".to_string()).unwrap();
        let root = trie.insert(&p("car"), &"B".to_string()).unwrap();

        let leaf_key = trie.get_path_nodes(&p("cat")).unwrap().last().unwrap().hash();
        store.delete_node(&leaf_key).unwrap();

        let trie = MerklePatriciaTrie::from_root(store, root, 1);
        assert!(matches!(
            trie.get_node_value(&p("cat")),
            Err(Error::NodeNotFound(k)) if k == leaf_key
        ));
    }

    #[test]
    fn test_reset_change_collector() {
        let mut trie = trie();
        trie.insert(&p("cat"), &"A".to_string()).unwrap();
        assert!(!trie.change_collector().is_empty());

        let root = trie.root();
        trie.reset_change_collector(Some(root));
        assert!(trie.change_collector().is_empty());
        assert_eq!(trie.root(), root);
    }
}
