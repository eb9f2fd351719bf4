//! Persisted Watch Snapshot
//!
//! The watcher remembers size and modification time of every tracked file it
//! saw in the previous cycle. The snapshot is a single JSON document:
//!
//! ```json
//! {
//!   "last_scan": "2024-05-01T12:00:00Z",
//!   "known_files": {
//!     "Artist/Album/01 - Song.flac": {"path": "Artist/Album/01 - Song.flac", "size": 1024, "modified": 1714564800000}
//!   }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::Result;

/// Observed state of one tracked file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileState {
    pub path: String,
    pub size: u64,
    /// Milliseconds since the Unix epoch
    pub modified: i64,
}

impl FileState {
    /// Whether `other` describes different content
    pub fn differs_from(&self, other: &FileState) -> bool {
        self.size != other.size || self.modified != other.modified
    }
}

/// Snapshot of the tracked tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchState {
    #[serde(default)]
    pub last_scan: Option<DateTime<Utc>>,
    #[serde(default)]
    pub known_files: BTreeMap<String, FileState>,
}

impl WatchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.known_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known_files.is_empty()
    }

    /// Load the snapshot at `path`
    ///
    /// A missing or corrupt file yields an empty snapshot; every file is then
    /// reported as new on the next cycle.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No watch state yet, starting empty");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<WatchState>(&content) {
            Ok(state) => {
                debug!(path = %path.display(), files = state.len(), "Watch state loaded");
                Ok(state)
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Corrupt watch state, starting from an empty snapshot"
                );
                Ok(Self::default())
            }
        }
    }

    /// Write the snapshot to `path`
    ///
    /// The document is written to a sibling temp file and renamed into place.
    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!(path = %path.display(), files = self.len(), "Watch state saved");
        Ok(())
    }
}
