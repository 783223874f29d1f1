//! Configuration.
//!
//! Values come from environment variables, falling back to defaults:
//! - `WEEKCHECK_ENDPOINT` - collector URL (default `http://localhost:5000/api/complete_week`)
//! - `WEEKCHECK_STATE_PATH` - where task state is persisted (default `.weekcheck/state.json`)
//! - `WEEKCHECK_STORE` - `json`, `sqlite` or `memory` (default `json`)
//! - `WEEKCHECK_DOWNLOAD_DIR` - where downloaded transcripts are written (default `.`)

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use crate::store::{JsonFileStore, KeyValueStore, MemoryStore, SqliteStore, StoreError};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/api/complete_week";
pub const DEFAULT_STATE_PATH: &str = ".weekcheck/state.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid collector endpoint {value:?}: {source}")]
    InvalidEndpoint {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Collector endpoint must be http or https, got {0}")]
    UnsupportedScheme(String),

    #[error("Unknown store kind {0:?} (expected json, sqlite or memory)")]
    UnknownStore(String),
}

/// Which backend persists task state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    #[default]
    Json,
    Sqlite,
    Memory,
}

impl FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::UnknownStore(other.to_string())),
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: Url,
    pub state_path: PathBuf,
    pub store: StoreKind,
    pub download_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            store: StoreKind::Json,
            download_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let endpoint = match var("WEEKCHECK_ENDPOINT") {
            Some(value) => parse_endpoint(&value)?,
            None => defaults.endpoint,
        };
        let store = match var("WEEKCHECK_STORE") {
            Some(value) => value.parse()?,
            None => defaults.store,
        };

        Ok(Self {
            endpoint,
            state_path: var("WEEKCHECK_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.state_path),
            store,
            download_dir: var("WEEKCHECK_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
        })
    }

    /// Open the configured state backend.
    pub fn open_store(&self) -> Result<Box<dyn KeyValueStore>, StoreError> {
        Ok(match self.store {
            StoreKind::Json => Box::new(JsonFileStore::open(&self.state_path)),
            StoreKind::Sqlite => Box::new(SqliteStore::open(&self.state_path)?),
            StoreKind::Memory => Box::new(MemoryStore::new()),
        })
    }
}

/// Parse and validate a collector endpoint.
pub fn parse_endpoint(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|source| ConfigError::InvalidEndpoint {
        value: value.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}
