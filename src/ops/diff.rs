//! Diff between two trie states

use super::Cancellation;
use crate::model::{Key, Path, ValueNode};
use crate::store::NodeStore;
use crate::trie::MerklePatriciaTrie;
use crate::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Type of change in a diff
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiffEntry {
    /// Path was added
    Added { path: Path, new_hash: Key },
    /// Path was removed
    Removed { path: Path, old_hash: Key },
    /// Value at path changed
    Modified {
        path: Path,
        old_hash: Key,
        new_hash: Key,
    },
}

impl DiffEntry {
    pub fn path(&self) -> &Path {
        match self {
            DiffEntry::Added { path, .. } => path,
            DiffEntry::Removed { path, .. } => path,
            DiffEntry::Modified { path, .. } => path,
        }
    }
}

/// A diff between two trie states, ordered by path
#[derive(Clone, Debug, Default)]
pub struct Diff {
    pub entries: Vec<DiffEntry>,
}

impl Diff {
    pub fn new(entries: Vec<DiffEntry>) -> Self {
        Diff { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn added_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, DiffEntry::Added { .. }))
            .count()
    }

    pub fn removed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, DiffEntry::Removed { .. }))
            .count()
    }

    pub fn modified_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, DiffEntry::Modified { .. }))
            .count()
    }
}

/// Compute the value-level diff between two roots in the same store
pub fn diff_roots(store: Arc<dyn NodeStore>, old_root: Key, new_root: Key) -> Result<Diff> {
    if old_root == new_root {
        return Ok(Diff::default());
    }

    let old_values = collect_values(store.clone(), old_root)?;
    let new_values = collect_values(store, new_root)?;

    let all_paths: BTreeSet<&Path> = old_values.keys().chain(new_values.keys()).collect();
    let mut entries = Vec::new();

    for path in all_paths {
        match (old_values.get(path), new_values.get(path)) {
            (None, Some(&new_hash)) => entries.push(DiffEntry::Added {
                path: path.clone(),
                new_hash,
            }),
            (Some(&old_hash), None) => entries.push(DiffEntry::Removed {
                path: path.clone(),
                old_hash,
            }),
            (Some(&old_hash), Some(&new_hash)) if old_hash != new_hash => {
                entries.push(DiffEntry::Modified {
                    path: path.clone(),
                    old_hash,
                    new_hash,
                })
            }
            _ => {}
        }
    }

    Ok(Diff::new(entries))
}

fn collect_values(store: Arc<dyn NodeStore>, root: Key) -> Result<BTreeMap<Path, Key>> {
    if root.is_zero() {
        return Ok(BTreeMap::new());
    }
    let trie = MerklePatriciaTrie::from_root(store, root, 0);
    Ok(trie
        .values(&Cancellation::new())?
        .into_iter()
        .map(|(path, value): (Path, ValueNode)| (path, value.hash()))
        .collect())
}
