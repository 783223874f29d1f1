//! Transcript builder - serializable snapshot of all task states.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::store::format_timestamp;
use crate::task::{Task, TaskRegistry};

/// Snapshot of one task inside a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSnapshot {
    pub id: String,
    pub label: String,
    pub checked: bool,
    /// Serialized as `null` when the task is not checked.
    #[serde(serialize_with = "serialize_opt_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Snapshot of the whole checklist at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    #[serde(serialize_with = "serialize_timestamp")]
    pub generated_at: DateTime<Utc>,
    pub total_tasks: usize,
    pub tasks: Vec<TaskSnapshot>,
}

impl Transcript {
    /// Build a transcript stamped with `generated_at`.
    pub fn build(registry: &TaskRegistry, generated_at: DateTime<Utc>) -> Self {
        let tasks: Vec<TaskSnapshot> = registry.tasks().iter().map(TaskSnapshot::from).collect();
        Self {
            generated_at,
            total_tasks: tasks.len(),
            tasks,
        }
    }

    /// Build a transcript stamped with the current time.
    pub fn build_now(registry: &TaskRegistry) -> Self {
        Self::build(registry, Utc::now())
    }

    /// Pretty JSON with 2-space indentation, as written to downloaded files.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<&Task> for TaskSnapshot {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            label: normalize_label(&task.label),
            checked: task.checked,
            completed_at: task.completed_at,
        }
    }
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn normalize_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn serialize_timestamp<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(*at))
}

fn serialize_opt_timestamp<S: Serializer>(
    at: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match at {
        Some(at) => serialize_timestamp(at, serializer),
        None => serializer.serialize_none(),
    }
}
