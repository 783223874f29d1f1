//! Checklist tracker - the event interface used by the UI.
//!
//! The UI calls one method per user action and renders what comes back:
//! - [`Checklist::on_toggle`]: checkbox changed, returns new progress and whether to prompt
//! - [`Checklist::on_deliver_confirmed`]: prompt accepted, delivers the transcript
//! - [`Checklist::on_cancel`]: prompt dismissed
//! - [`Checklist::on_manual_download`]: download button, always saves locally

use chrono::{SubsecRound, Utc};
use thiserror::Error;

use crate::delivery::{DeliveryCoordinator, DeliveryError, DeliveryOutcome, LocalReason};
use crate::progress::{self, CompletionNotifier};
use crate::store::{KeyValueStore, TaskStateStore};
use crate::task::{Task, TaskError, TaskRegistry, TaskSpec};
use crate::transcript::Transcript;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Checklist is not complete; use a manual download instead")]
    NotComplete,

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// What the UI should show after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub percentage: u8,
    pub complete: bool,
    /// The list just became complete; show the confirmation prompt.
    pub show_prompt: bool,
}

/// A checklist bound to its persisted state and delivery path.
pub struct Checklist<S> {
    registry: TaskRegistry,
    store: TaskStateStore<S>,
    notifier: CompletionNotifier,
    coordinator: DeliveryCoordinator,
    prompt_visible: bool,
}

impl<S: KeyValueStore> Checklist<S> {
    /// Build the checklist from the UI's task list, restoring persisted state.
    pub fn new(
        specs: Vec<TaskSpec>,
        store: S,
        coordinator: DeliveryCoordinator,
    ) -> Result<Self, TrackerError> {
        let store = TaskStateStore::new(store);
        let registry = TaskRegistry::from_specs(specs, &store)?;
        let notifier = CompletionNotifier::new(progress::is_complete(registry.tasks()));

        tracing::debug!(
            total = registry.len(),
            checked = registry.checked_count(),
            "Checklist loaded"
        );

        Ok(Self {
            registry,
            store,
            notifier,
            coordinator,
            prompt_visible: false,
        })
    }

    /// A task was checked or unchecked.
    ///
    /// Setting a task to the state it already has changes nothing, not even
    /// its completion time. Otherwise the in-memory state always changes; a
    /// failed store write is logged and otherwise ignored.
    pub fn on_toggle(&mut self, id: &str, checked: bool) -> Result<ToggleOutcome, TrackerError> {
        // Persisted stamps carry millisecond precision; keep memory in step.
        let now = Utc::now().trunc_subsecs(3);
        let task = self
            .registry
            .get_mut(id)
            .ok_or_else(|| TrackerError::UnknownTask(id.to_string()))?;

        if task.checked == checked {
            return Ok(ToggleOutcome {
                percentage: self.progress(),
                complete: self.is_complete(),
                show_prompt: false,
            });
        }

        task.checked = checked;
        task.completed_at = checked.then_some(now);

        if let Err(e) = self.store.set_at(id, checked, now) {
            tracing::warn!(task_id = id, "Failed to persist task state: {}", e);
        }

        let complete = progress::is_complete(self.registry.tasks());
        let show_prompt = self.notifier.observe(complete);
        if show_prompt {
            self.prompt_visible = true;
        }

        Ok(ToggleOutcome {
            percentage: self.progress(),
            complete,
            show_prompt,
        })
    }

    /// The user confirmed the completion prompt.
    ///
    /// Only a complete checklist is sent to the collector.
    pub async fn on_deliver_confirmed(&mut self) -> Result<DeliveryOutcome, TrackerError> {
        self.prompt_visible = false;
        if !self.is_complete() {
            return Err(TrackerError::NotComplete);
        }
        let transcript = self.transcript();
        Ok(self.coordinator.deliver(&transcript).await?)
    }

    /// The user dismissed the completion prompt.
    pub fn on_cancel(&mut self) {
        self.prompt_visible = false;
    }

    /// The user asked for a download regardless of completion.
    pub fn on_manual_download(&mut self) -> Result<DeliveryOutcome, TrackerError> {
        let transcript = self.transcript();
        Ok(self
            .coordinator
            .deliver_local(&transcript, LocalReason::Manual)?)
    }

    pub fn progress(&self) -> u8 {
        progress::percentage(self.registry.tasks())
    }

    pub fn is_complete(&self) -> bool {
        progress::is_complete(self.registry.tasks())
    }

    pub fn tasks(&self) -> &[Task] {
        self.registry.tasks()
    }

    pub fn prompt_visible(&self) -> bool {
        self.prompt_visible
    }

    /// Snapshot the current state.
    pub fn transcript(&self) -> Transcript {
        Transcript::build_now(&self.registry)
    }

    pub fn store(&self) -> &TaskStateStore<S> {
        &self.store
    }
}
