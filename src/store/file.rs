//! JSON file backend.
//!
//! Persists every key as a flat JSON object. Each mutation rewrites the file,
//! so state survives restarts without an explicit flush.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{KeyValueStore, StoreError};

/// Key-value store backed by a single JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    entries: BTreeMap<String, String>,
    storage_path: PathBuf,
}

impl JsonFileStore {
    /// Open the store at `path`, loading existing entries if the file exists.
    ///
    /// A file that cannot be parsed is logged and treated as empty; it is
    /// overwritten on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let storage_path = path.into();

        let entries = if storage_path.exists() {
            match Self::load_from_path(&storage_path) {
                Ok(entries) => {
                    tracing::debug!("Loaded task state from {}", storage_path.display());
                    entries
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to load task state from {}: {}, starting empty",
                        storage_path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Self {
            entries,
            storage_path,
        }
    }

    fn load_from_path(path: &Path) -> Result<BTreeMap<String, String>, StoreError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save_to_disk(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.storage_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.storage_path, contents)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.save_to_disk()
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.entries.remove(key).is_some() {
            self.save_to_disk()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_state_survives_reopen() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested/state.json");

        let mut store = JsonFileStore::open(&path);
        store.set("task-a", "true").unwrap();
        store.set("task-a-ts", "2024-01-01T00:00:00.000Z").unwrap();
        store.set("task-b", "false").unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get("task-a").as_deref(), Some("true"));
        assert_eq!(
            reopened.get("task-a-ts").as_deref(),
            Some("2024-01-01T00:00:00.000Z")
        );
        assert_eq!(reopened.get("task-b").as_deref(), Some("false"));
    }

    #[test]
    fn test_remove_is_persisted() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("state.json");

        let mut store = JsonFileStore::open(&path);
        store.set("task-a-ts", "x").unwrap();
        store.remove("task-a-ts").unwrap();
        store.remove("never-written").unwrap();

        assert!(JsonFileStore::open(&path).get("task-a-ts").is_none());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let mut store = JsonFileStore::open(&path);
        assert!(store.get("task-a").is_none());

        store.set("task-a", "true").unwrap();
        assert_eq!(
            JsonFileStore::open(&path).get("task-a").as_deref(),
            Some("true")
        );
    }
}
