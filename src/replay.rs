//! Round-by-round replay of a JSON edit script
//!
//! Each round is built the way a block is: a trie opened at the previous
//! round's root over an overlay of the persisted store, edited, then flushed
//! with its changes stamped with the round number.

use crate::config::TrieConfig;
use crate::model::{Key, Path, Sequence};
use crate::ops::Cancellation;
use crate::store::{MemoryNodeStore, NodeStore, OverlayNodeStore};
use crate::trie::MerklePatriciaTrie;
use crate::{Error, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    pub rounds: Vec<Round>,
}

/// Edits applied at one round: puts first, then deletes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Round {
    pub round: Sequence,
    #[serde(default)]
    pub put: BTreeMap<String, String>,
    #[serde(default)]
    pub delete: Vec<String>,
}

impl Script {
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let script: Script = serde_json::from_str(content)?;
        script.check()?;
        Ok(script)
    }

    fn check(&self) -> Result<()> {
        for pair in self.rounds.windows(2) {
            if pair[1].round <= pair[0].round {
                return Err(Error::Script(format!(
                    "round {} does not follow round {}",
                    pair[1].round, pair[0].round
                )));
            }
        }
        Ok(())
    }
}

/// Outcome of one replayed round
#[derive(Debug, Clone, Serialize)]
pub struct RoundSummary {
    pub round: Sequence,
    pub root: String,
    pub puts: usize,
    pub deletes: usize,
    /// Deletes of keys that held no value
    pub missing: usize,
    /// Nodes written for this round
    pub changes: usize,
}

/// Trie state across replayed rounds
pub struct Replay {
    store: Arc<MemoryNodeStore>,
    roots: BTreeMap<Sequence, Key>,
    config: TrieConfig,
}

/// Map a script key onto a trie path
pub fn key_path(key: &str) -> Path {
    Path::from_bytes(key.as_bytes())
}

impl Replay {
    pub fn new(config: TrieConfig) -> Self {
        Replay {
            store: Arc::new(MemoryNodeStore::new()),
            roots: BTreeMap::new(),
            config,
        }
    }

    /// Replay every round of `script`
    pub fn run(&mut self, script: &Script) -> Result<Vec<RoundSummary>> {
        script.check()?;
        script
            .rounds
            .iter()
            .map(|round| self.apply_round(round))
            .collect()
    }

    pub fn apply_round(&mut self, round: &Round) -> Result<RoundSummary> {
        if let Some((&last, _)) = self.roots.last_key_value() {
            if round.round <= last {
                return Err(Error::Script(format!(
                    "round {} does not follow round {}",
                    round.round, last
                )));
            }
        }

        let prior: Arc<dyn NodeStore> = self.store.clone();
        let overlay = Arc::new(OverlayNodeStore::new(prior));
        let mut trie = MerklePatriciaTrie::with_config(overlay, round.round, &self.config);
        trie.set_root(self.latest_root());

        for (key, value) in &round.put {
            trie.insert(&key_path(key), value)?;
        }

        let mut missing = 0;
        for key in &round.delete {
            match trie.delete(&key_path(key)) {
                Ok(_) => {}
                Err(Error::ValueNotPresent) => {
                    warn!("round {}: nothing to delete at {:?}", round.round, key);
                    missing += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let changes = trie.change_collector().len();
        trie.save_changes(&*self.store, self.config.include_deletes)?;
        self.roots.insert(round.round, trie.root());

        info!(
            "round {}: root {} ({} changes)",
            round.round,
            trie.root().short(),
            changes
        );
        Ok(RoundSummary {
            round: round.round,
            root: trie.root().to_hex(),
            puts: round.put.len(),
            deletes: round.delete.len() - missing,
            missing,
            changes,
        })
    }

    pub fn store(&self) -> &Arc<MemoryNodeStore> {
        &self.store
    }

    pub fn config(&self) -> &TrieConfig {
        &self.config
    }

    /// Root after every replayed round
    pub fn roots(&self) -> &BTreeMap<Sequence, Key> {
        &self.roots
    }

    pub fn latest_round(&self) -> Option<Sequence> {
        self.roots.keys().next_back().copied()
    }

    fn latest_root(&self) -> Key {
        self.roots.values().next_back().copied().unwrap_or(Key::ZERO)
    }

    /// The state as of `round`: the root of the last round at or before it
    pub fn root_at(&self, round: Sequence) -> Key {
        self.roots
            .range(..=round)
            .next_back()
            .map(|(_, root)| *root)
            .unwrap_or(Key::ZERO)
    }

    /// A read-only view of the state as of `round`
    pub fn trie_at(&self, round: Sequence) -> MerklePatriciaTrie {
        let mut trie = MerklePatriciaTrie::with_config(self.store.clone(), round, &self.config);
        trie.set_root(self.root_at(round));
        trie
    }

    /// Validate the trie of every replayed round
    pub fn validate(&self, cancel: &Cancellation) -> Result<()> {
        for &round in self.roots.keys() {
            self.trie_at(round).validate(cancel)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = r#"{
        "rounds": [
            {"round": 1, "put": {"cat": "A", "car": "B"}},
            {"round": 2, "put": {"dog": "C"}, "delete": ["cat", "cow"]},
            {"round": 5, "put": {"car": "B2"}}
        ]
    }"#;

    #[test]
    fn test_replay_rounds() {
        let script = Script::parse(SCRIPT).unwrap();
        let mut replay = Replay::new(TrieConfig::default());
        let summaries = replay.run(&script).unwrap();

        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[1].deletes, 1);
        assert_eq!(summaries[1].missing, 1);
        assert_eq!(replay.latest_round(), Some(5));

        let get = |round: Sequence, key: &str| {
            replay
                .trie_at(round)
                .get::<String>(&key_path(key))
                .unwrap()
        };
        assert_eq!(get(1, "cat").as_deref(), Some("A"));
        assert_eq!(get(2, "cat"), None);
        assert_eq!(get(4, "dog").as_deref(), Some("C"));
        assert_eq!(get(5, "car").as_deref(), Some("B2"));
        assert_eq!(get(1, "car").as_deref(), Some("B"));
        assert_eq!(replay.root_at(0), Key::ZERO);

        replay.validate(&Cancellation::new()).unwrap();
    }

    #[test]
    fn test_rounds_must_increase() {
        let err = Script::parse(r#"{"rounds": [{"round": 3}, {"round": 3}]}"#).unwrap_err();
        assert!(matches!(err, Error::Script(_)));

        let mut replay = Replay::new(TrieConfig::default());
        let round = |round| Round {
            round,
            ..Default::default()
        };
        replay.apply_round(&round(4)).unwrap();
        let err = replay.apply_round(&round(2)).unwrap_err();
        assert!(matches!(err, Error::Script(_)));
    }
}
