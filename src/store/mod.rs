//! Local state store - persists task completion flags and timestamps.
//!
//! The store is split in two layers:
//! - [`KeyValueStore`]: raw string key-value persistence (memory, JSON file, SQLite)
//! - [`TaskStateStore`]: the task-level contract on top of it
//!
//! ## Key layout
//!
//! ```text
//! task-<id>     "true" | "false"
//! task-<id>-ts  ISO-8601 timestamp, present only while the flag is "true"
//! ```

mod file;
mod memory;
mod sqlite;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Errors raised by a store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Raw string key-value persistence.
///
/// Reads never fail: a backend that cannot read a key reports it as absent.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

/// Key holding the completion flag of a task.
pub fn flag_key(task_id: &str) -> String {
    format!("task-{}", task_id)
}

/// Key holding the completion timestamp of a task.
pub fn timestamp_key(task_id: &str) -> String {
    format!("task-{}-ts", task_id)
}

/// Format a timestamp the way it is persisted (`2024-05-06T07:08:09.123Z`).
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Task-level view of a [`KeyValueStore`].
#[derive(Debug)]
pub struct TaskStateStore<S> {
    inner: S,
}

impl<S: KeyValueStore> TaskStateStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Record a task's completion flag, stamping it with the current time when checked.
    pub fn set(&mut self, task_id: &str, checked: bool) -> Result<(), StoreError> {
        self.set_at(task_id, checked, Utc::now())
    }

    /// Record a task's completion flag with an explicit completion time.
    ///
    /// Invariant: the timestamp key exists if and only if the flag is `"true"`.
    /// The timestamp is written before the flag and removed after it, so a
    /// failed write leaves at worst a stray timestamp next to an unchecked
    /// flag. That stray is rolled back when possible and ignored on read.
    pub fn set_at(
        &mut self,
        task_id: &str,
        checked: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let flag = flag_key(task_id);
        let ts = timestamp_key(task_id);

        if checked {
            self.inner.set(&ts, &format_timestamp(at))?;
            if let Err(e) = self.inner.set(&flag, "true") {
                if let Err(undo) = self.inner.remove(&ts) {
                    tracing::warn!(task_id, "Failed to roll back completion timestamp: {}", undo);
                }
                return Err(e);
            }
        } else {
            self.inner.set(&flag, "false")?;
            if let Err(e) = self.inner.remove(&ts) {
                tracing::warn!(task_id, "Stale completion timestamp left behind: {}", e);
                return Err(e);
            }
        }
        tracing::debug!(task_id, checked, "Persisted task state");
        Ok(())
    }

    /// Whether the task was persisted as checked. Never-written tasks read as false.
    pub fn get(&self, task_id: &str) -> bool {
        self.inner.get(&flag_key(task_id)).as_deref() == Some("true")
    }

    /// When the task was checked, if it is checked and the stamp parses.
    pub fn completed_at(&self, task_id: &str) -> Option<DateTime<Utc>> {
        if !self.get(task_id) {
            return None;
        }
        let raw = self.inner.get(&timestamp_key(task_id))?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!(task_id, "Ignoring unparseable completion timestamp {:?}: {}", raw, e);
                None
            }
        }
    }

    /// Access the underlying backend.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_unwritten_task_reads_unchecked() {
        let store = TaskStateStore::new(MemoryStore::new());
        assert!(!store.get("a"));
        assert!(store.completed_at("a").is_none());
    }

    #[test]
    fn test_check_writes_flag_and_timestamp() {
        let mut store = TaskStateStore::new(MemoryStore::new());
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        store.set_at("a", true, at).unwrap();

        assert!(store.get("a"));
        assert_eq!(store.completed_at("a"), Some(at));
        assert_eq!(store.inner().get("task-a").as_deref(), Some("true"));
        assert_eq!(
            store.inner().get("task-a-ts").as_deref(),
            Some("2024-05-06T07:08:09.000Z")
        );
    }

    #[test]
    fn test_uncheck_clears_timestamp() {
        let mut store = TaskStateStore::new(MemoryStore::new());
        store.set("a", true).unwrap();
        store.set("a", false).unwrap();

        assert!(!store.get("a"));
        assert_eq!(store.inner().get("task-a").as_deref(), Some("false"));
        assert!(store.inner().get("task-a-ts").is_none());
    }

    #[test]
    fn test_toggle_round_trip_does_not_restore_timestamp() {
        let mut store = TaskStateStore::new(MemoryStore::new());
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();

        store.set_at("a", true, first).unwrap();
        store.set_at("a", false, second).unwrap();
        store.set_at("a", true, second).unwrap();

        assert!(store.get("a"));
        assert_eq!(store.completed_at("a"), Some(second));
    }

    #[test]
    fn test_only_exact_true_counts_as_checked() {
        let mut raw = MemoryStore::new();
        raw.set("task-a", "TRUE").unwrap();
        raw.set("task-b", "1").unwrap();
        let store = TaskStateStore::new(raw);
        assert!(!store.get("a"));
        assert!(!store.get("b"));
    }

    /// Backend whose writes to selected keys fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_set_suffix: Option<&'static str>,
        fail_remove: bool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            match self.fail_set_suffix {
                Some(suffix) if key.ends_with(suffix) => Err(StoreError::Io(
                    std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                )),
                _ => self.inner.set(key, value),
            }
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            if self.fail_remove {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "read-only",
                )));
            }
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_failed_timestamp_write_leaves_flag_unchecked() {
        let mut store = TaskStateStore::new(FlakyStore {
            fail_set_suffix: Some("-ts"),
            ..Default::default()
        });

        assert!(store.set("a", true).is_err());
        assert!(store.inner().get("task-a").is_none());
        assert!(store.inner().get("task-a-ts").is_none());
        assert!(!store.get("a"));
    }

    #[test]
    fn test_failed_flag_write_rolls_back_timestamp() {
        let mut store = TaskStateStore::new(FlakyStore {
            fail_set_suffix: Some("task-a"),
            ..Default::default()
        });

        assert!(store.set("a", true).is_err());
        assert!(store.inner().get("task-a").is_none());
        assert!(store.inner().get("task-a-ts").is_none());
    }

    #[test]
    fn test_stale_timestamp_is_ignored_for_unchecked_task() {
        let mut store = TaskStateStore::new(FlakyStore::default());
        store.set("a", true).unwrap();
        store.inner.fail_remove = true;

        assert!(store.set("a", false).is_err());
        assert!(!store.get("a"));
        assert!(store.completed_at("a").is_none());
    }

    #[test]
    fn test_garbage_timestamp_reads_absent() {
        let mut raw = MemoryStore::new();
        raw.set("task-a", "true").unwrap();
        raw.set("task-a-ts", "yesterday").unwrap();
        let store = TaskStateStore::new(raw);
        assert!(store.get("a"));
        assert!(store.completed_at("a").is_none());
    }
}
