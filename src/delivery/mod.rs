//! Delivery coordinator - gets a transcript to the user one way or another.
//!
//! ## Paths
//!
//! ```text
//!   deliver ──► Collector::submit ──ok──► download_url? ──yes──► Navigator::navigate
//!                  │                          │                      │
//!                  │ error                    no                     │ error
//!                  ▼                          ▼                      ▼
//!            local fallback            "saved, no download"    local copy
//!                                                           ("saved, download failed")
//!
//!   deliver_local ──► LocalSink::save  (manual trigger, never touches the network)
//! ```
//!
//! Any failure in the remote attempt is logged and recovered by saving the
//! transcript locally. The status tells apart a collector that was never
//! reached from one that stored the transcript but whose download failed.
//! There are no retries and no timeouts.

mod local;
mod remote;

pub use local::{fallback_filename, DirectorySink, LocalSink};
pub use remote::{
    resolve_download_url, Collector, CollectorReply, HttpCollector, HttpFetchNavigator, Navigator,
    RemoteError,
};

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use url::Url;

use crate::transcript::Transcript;

/// Only the local save can fail a delivery; remote failures are recovered.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Failed to serialize transcript: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to save transcript locally: {0}")]
    Local(#[from] std::io::Error),
}

/// User-facing delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Remote attempt in flight.
    Saving,
    SavedDownloadStarting,
    SavedNoDownload,
    /// The collector accepted the transcript but its download could not be fetched.
    SavedDownloadFailed,
    OfflineSavedLocally,
    ManualDownloaded,
}

impl DeliveryStatus {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Saving => "Saving weekly transcript...",
            Self::SavedDownloadStarting => "Transcript saved. The download should start shortly.",
            Self::SavedNoDownload => "Transcript saved, but no download is available.",
            Self::SavedDownloadFailed => {
                "Transcript saved, but the download failed: a copy was saved locally."
            }
            Self::OfflineSavedLocally => "Offline: transcript downloaded locally.",
            Self::ManualDownloaded => "Transcript generated and downloaded (manual).",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub status: DeliveryStatus,
    /// File written by the local path, if it ran.
    pub local_file: Option<PathBuf>,
    /// Absolute download URL followed after a remote save, if any.
    pub download_url: Option<Url>,
}

/// Why a transcript is being saved locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalReason {
    /// The remote attempt failed.
    Fallback,
    /// The collector stored the transcript but the download did not go through.
    DownloadFailed,
    /// The user asked for a download directly.
    Manual,
}

impl LocalReason {
    fn status(self) -> DeliveryStatus {
        match self {
            Self::Fallback => DeliveryStatus::OfflineSavedLocally,
            Self::DownloadFailed => DeliveryStatus::SavedDownloadFailed,
            Self::Manual => DeliveryStatus::ManualDownloaded,
        }
    }
}

/// Outcome of a successful remote attempt.
enum RemoteOutcome {
    DownloadStarted(Url),
    NoDownload,
    /// Accepted remotely; following the download reference failed.
    DownloadFailed(RemoteError),
}

/// Sends transcripts to the collector, falling back to local files.
pub struct DeliveryCoordinator {
    endpoint: Url,
    collector: Arc<dyn Collector>,
    navigator: Arc<dyn Navigator>,
    sink: Arc<dyn LocalSink>,
}

impl DeliveryCoordinator {
    pub fn new(
        endpoint: Url,
        collector: Arc<dyn Collector>,
        navigator: Arc<dyn Navigator>,
        sink: Arc<dyn LocalSink>,
    ) -> Self {
        Self {
            endpoint,
            collector,
            navigator,
            sink,
        }
    }

    /// Standard wiring: HTTP collector at `endpoint`, downloads and local
    /// saves both land in `download_dir`.
    pub fn http(endpoint: Url, download_dir: impl Into<PathBuf>) -> Self {
        let client = reqwest::Client::new();
        let sink: Arc<dyn LocalSink> = Arc::new(DirectorySink::new(download_dir));
        Self::new(
            endpoint.clone(),
            Arc::new(HttpCollector::with_client(client.clone(), endpoint)),
            Arc::new(HttpFetchNavigator::with_client(client, Arc::clone(&sink))),
            sink,
        )
    }

    /// Try the collector first; save locally if anything goes wrong.
    pub async fn deliver(&self, transcript: &Transcript) -> Result<DeliveryOutcome, DeliveryError> {
        tracing::info!(
            endpoint = %self.endpoint,
            total_tasks = transcript.total_tasks,
            "Delivering transcript"
        );

        match self.try_remote(transcript).await {
            Ok(RemoteOutcome::DownloadStarted(url)) => {
                tracing::info!("Transcript saved remotely, downloading from {}", url);
                Ok(DeliveryOutcome {
                    status: DeliveryStatus::SavedDownloadStarting,
                    local_file: None,
                    download_url: Some(url),
                })
            }
            Ok(RemoteOutcome::NoDownload) => {
                tracing::info!("Transcript saved remotely, collector returned no download");
                Ok(DeliveryOutcome {
                    status: DeliveryStatus::SavedNoDownload,
                    local_file: None,
                    download_url: None,
                })
            }
            Ok(RemoteOutcome::DownloadFailed(e)) => {
                tracing::warn!("Transcript saved remotely but download failed, saving locally: {}", e);
                self.deliver_local(transcript, LocalReason::DownloadFailed)
            }
            Err(e) => {
                tracing::warn!("Remote delivery failed, saving locally: {}", e);
                self.deliver_local(transcript, LocalReason::Fallback)
            }
        }
    }

    async fn try_remote(&self, transcript: &Transcript) -> Result<RemoteOutcome, RemoteError> {
        let reply = self.collector.submit(transcript).await?;

        let Some(reference) = reply.download_url else {
            return Ok(RemoteOutcome::NoDownload);
        };

        let url = match resolve_download_url(&self.endpoint, &reference) {
            Ok(url) => url,
            Err(e) => return Ok(RemoteOutcome::DownloadFailed(e)),
        };
        match self.navigator.navigate(&url).await {
            Ok(()) => Ok(RemoteOutcome::DownloadStarted(url)),
            Err(e) => Ok(RemoteOutcome::DownloadFailed(e)),
        }
    }

    /// Save the transcript as `transcript-week-<today>.json`.
    pub fn deliver_local(
        &self,
        transcript: &Transcript,
        reason: LocalReason,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        self.deliver_local_on(transcript, reason, Utc::now().date_naive())
    }

    fn deliver_local_on(
        &self,
        transcript: &Transcript,
        reason: LocalReason,
        date: NaiveDate,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let contents = transcript.to_pretty_json()?;
        let path = self
            .sink
            .save(&fallback_filename(date), contents.as_bytes())?;

        tracing::info!(?reason, "Transcript saved locally to {}", path.display());
        Ok(DeliveryOutcome {
            status: reason.status(),
            local_file: Some(path),
            download_url: None,
        })
    }
}
