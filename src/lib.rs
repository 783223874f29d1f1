//! # weekcheck
//!
//! A weekly checklist tracker with transcript delivery.
//!
//! This library provides:
//! - Persistent task completion state (memory, JSON file or SQLite)
//! - Progress calculation and completion detection
//! - Transcript snapshots of all task states
//! - Delivery to a remote collector, with a local file fallback
//!
//! ## Architecture
//!
//! ```text
//!   UI ──on_toggle──► Checklist ──► TaskStateStore ──► KeyValueStore
//!                        │
//!                        ├──► progress (percentage, completion prompt)
//!                        │
//!   UI ──on_deliver──►   └──► Transcript ──► DeliveryCoordinator
//!                                              │            │
//!                                              ▼            ▼
//!                                          Collector     LocalSink
//!                                         (HTTP POST)   (JSON file)
//! ```
//!
//! ## Event Flow
//! 1. User toggles a task; state is persisted and progress recomputed
//! 2. When every task is checked, the UI is told to show a confirmation prompt
//! 3. On confirmation, a transcript is built and posted to the collector
//! 4. If the collector is unreachable or fails, the transcript is saved locally
//!
//! ## Modules
//! - `store`: key-value backends and the task state layout
//! - `task`: task specs and the ordered registry
//! - `progress`: percentage and completion notification
//! - `transcript`: snapshot construction
//! - `delivery`: remote delivery and local fallback
//! - `tracker`: the event interface the UI drives
//! - `config`: environment-driven configuration

pub mod config;
pub mod delivery;
pub mod progress;
pub mod store;
pub mod task;
pub mod tracker;
pub mod transcript;

pub use config::Config;
pub use delivery::{DeliveryCoordinator, DeliveryOutcome, DeliveryStatus};
pub use task::{Task, TaskRegistry, TaskSpec};
pub use tracker::{Checklist, ToggleOutcome, TrackerError};
pub use transcript::Transcript;
