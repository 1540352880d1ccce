//! Trie configuration
//!
//! Stored as JSON in ~/.config/state_trie/config.json. Every field has a
//! default, so a partial file is fine.

use crate::{Error, Result, DEFAULT_BATCH_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrieConfig {
    /// Nodes per `multi_put_node` call during flushes and version bumps
    pub batch_size: usize,
    /// Log per-node diagnostics (missing nodes, version bumps)
    pub trace_state: bool,
    /// Delete superseded nodes when saving changes
    pub include_deletes: bool,
}

impl Default for TrieConfig {
    fn default() -> Self {
        TrieConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            trace_state: false,
            include_deletes: false,
        }
    }
}

impl TrieConfig {
    /// Default config location (~/.config/state_trie/config.json)
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("state_trie").join("config.json"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        let config: TrieConfig = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or from the default location when `None`
    ///
    /// A missing file yields the defaults; an unreadable one is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Ok(path) => path,
                Err(_) => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = TrieConfig::default();
        assert_eq!(config.batch_size, 256);
        assert!(!config.trace_state);
        assert!(!config.include_deletes);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = TrieConfig {
            batch_size: 16,
            trace_state: true,
            include_deletes: false,
        };
        config.save(&path).unwrap();

        assert_eq!(TrieConfig::load(&path).unwrap(), config);
        assert_eq!(TrieConfig::load_or_default(Some(&path)).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"trace_state": true}"#).unwrap();

        let config = TrieConfig::load(&path).unwrap();
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert!(config.trace_state);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"batch_size": 0}"#).unwrap();

        assert!(matches!(TrieConfig::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert_eq!(
            TrieConfig::load_or_default(Some(&path)).unwrap(),
            TrieConfig::default()
        );
    }
}
