//! Local delivery: saving transcripts as files.

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// Destination for locally saved files.
pub trait LocalSink: Send + Sync {
    /// Save `contents` under `filename`, returning where it ended up.
    fn save(&self, filename: &str, contents: &[u8]) -> io::Result<PathBuf>;
}

/// Saves files into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl LocalSink for DirectorySink {
    fn save(&self, filename: &str, contents: &[u8]) -> io::Result<PathBuf> {
        // Only the final component is honoured; names from the network must
        // not escape the directory.
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid file name: {:?}", filename),
                )
            })?;

        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

/// Name of a locally saved transcript: `transcript-week-<YYYY-MM-DD>.json`.
pub fn fallback_filename(date: NaiveDate) -> String {
    format!("transcript-week-{}.json", date.format("%Y-%m-%d"))
}
