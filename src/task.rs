//! Task registry - the ordered list of tracked tasks.
//!
//! Tasks are supplied by the caller as [`TaskSpec`]s (id, label, initial state)
//! and restored against the persisted state at startup. Tasks are never added
//! or removed afterwards; only their checked state changes.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{KeyValueStore, TaskStateStore};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task id must not be empty (label: {0:?})")]
    EmptyId(String),

    #[error("Duplicate task id: {0}")]
    DuplicateId(String),

    #[error("Failed to read task list {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid task list {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A task as described by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub initial_checked: bool,
}

impl TaskSpec {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            initial_checked: false,
        }
    }

    /// Load a JSON array of task specs.
    pub fn load_list(path: &Path) -> Result<Vec<TaskSpec>, TaskError> {
        let contents = std::fs::read_to_string(path).map_err(|source| TaskError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| TaskError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// A tracked task and its current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub label: String,
    pub checked: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Ordered, fixed set of tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
}

impl TaskRegistry {
    /// Build the registry in the given order, restoring persisted state.
    ///
    /// A task is checked if it starts checked or was persisted as checked.
    pub fn from_specs<S: KeyValueStore>(
        specs: Vec<TaskSpec>,
        store: &TaskStateStore<S>,
    ) -> Result<Self, TaskError> {
        let mut seen = HashSet::new();
        let mut tasks = Vec::with_capacity(specs.len());

        for spec in specs {
            if spec.id.is_empty() {
                return Err(TaskError::EmptyId(spec.label));
            }
            if !seen.insert(spec.id.clone()) {
                return Err(TaskError::DuplicateId(spec.id));
            }

            let persisted = store.get(&spec.id);
            let completed_at = if persisted {
                store.completed_at(&spec.id)
            } else {
                None
            };
            tasks.push(Task {
                checked: spec.initial_checked || persisted,
                completed_at,
                id: spec.id,
                label: spec.label,
            });
        }

        Ok(Self { tasks })
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn checked_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.checked).count()
    }
}
