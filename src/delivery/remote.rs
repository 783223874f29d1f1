//! Remote delivery: posting transcripts to the collector and following the
//! download reference it returns.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::local::LocalSink;
use crate::transcript::Transcript;

/// Anything that makes the remote attempt fail. Every variant leads to the
/// local fallback.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Request to collector failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Collector returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Collector response is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Cannot build download URL from {reference:?}: {reason}")]
    InvalidDownloadUrl { reference: String, reason: String },

    #[error("Download from {url} failed: {reason}")]
    Navigation { url: String, reason: String },
}

/// What the collector said after accepting a transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectorReply {
    /// Path of the stored transcript, relative to the collector's origin.
    pub download_url: Option<String>,
}

impl CollectorReply {
    /// Interpret a response body. Only a non-empty string `download_url` counts.
    pub fn from_body(body: &serde_json::Value) -> Self {
        let download_url = body
            .get("download_url")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Self { download_url }
    }
}

/// Remote collector accepting transcripts.
#[async_trait]
pub trait Collector: Send + Sync {
    async fn submit(&self, transcript: &Transcript) -> Result<CollectorReply, RemoteError>;
}

/// Starts the download of a stored transcript.
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate(&self, url: &Url) -> Result<(), RemoteError>;
}

#[derive(Serialize)]
struct SubmitRequest<'a> {
    transcript: &'a Transcript,
}

/// Collector reached over HTTP: `POST <endpoint>` with `{"transcript": ...}`.
pub struct HttpCollector {
    client: Client,
    endpoint: Url,
}

impl HttpCollector {
    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl Collector for HttpCollector {
    async fn submit(&self, transcript: &Transcript) -> Result<CollectorReply, RemoteError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(&SubmitRequest { transcript })
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let body: serde_json::Value = serde_json::from_str(&text)?;
        Ok(CollectorReply::from_body(&body))
    }
}

/// Navigator that fetches the download URL and saves the body locally,
/// the way a browser would when navigating to an attachment.
pub struct HttpFetchNavigator {
    client: Client,
    sink: Arc<dyn LocalSink>,
}

impl HttpFetchNavigator {
    pub fn with_client(client: Client, sink: Arc<dyn LocalSink>) -> Self {
        Self { client, sink }
    }
}

#[async_trait]
impl Navigator for HttpFetchNavigator {
    async fn navigate(&self, url: &Url) -> Result<(), RemoteError> {
        let resp = self.client.get(url.clone()).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::Navigation {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        let filename = resp
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .or_else(|| filename_from_url(url))
            .unwrap_or_else(|| "download.json".to_string());

        let bytes = resp.bytes().await?;
        let path = self
            .sink
            .save(&filename, &bytes)
            .map_err(|e| RemoteError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!("Downloaded {} to {}", url, path.display());
        Ok(())
    }
}

/// Turn the collector's download reference into an absolute URL.
///
/// Absolute references are used as-is; anything else is appended to the
/// endpoint's origin.
pub fn resolve_download_url(endpoint: &Url, reference: &str) -> Result<Url, RemoteError> {
    let invalid = |reason: String| RemoteError::InvalidDownloadUrl {
        reference: reference.to_string(),
        reason,
    };

    if let Ok(absolute) = Url::parse(reference) {
        return Ok(absolute);
    }

    let origin = endpoint.origin();
    if !origin.is_tuple() {
        return Err(invalid(format!("endpoint {} has no origin", endpoint)));
    }

    let separator = if reference.starts_with('/') { "" } else { "/" };
    let joined = format!("{}{}{}", origin.ascii_serialization(), separator, reference);
    Url::parse(&joined).map_err(|e| invalid(e.to_string()))
}

/// Extract `filename` from a `Content-Disposition` header value.
fn filename_from_disposition(value: &str) -> Option<String> {
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

fn filename_from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .last()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
