//! Undo Journal
//!
//! Every mutation applied to the share is recorded as one JSON object per
//! line. Entries are buffered in memory and appended to the journal file by
//! [`UndoLog::save`]; existing lines are never rewritten. Replaying the
//! journal is left to the operator (`mm journal`).

use bridge_traits::time::{Clock, SystemClock};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::Result;

/// One recorded mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoLogEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub operation: UndoOperation,
}

/// Mutation payload, tagged by `operation`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum UndoOperation {
    Rename {
        src: String,
        dst: String,
    },
    /// State of `path` before it was written
    Write {
        path: String,
        had_previous: bool,
        previous_size: u64,
    },
    Delete {
        path: String,
    },
}

impl UndoOperation {
    /// Operation name as stored in the journal
    pub fn name(&self) -> &'static str {
        match self {
            UndoOperation::Rename { .. } => "rename",
            UndoOperation::Write { .. } => "write",
            UndoOperation::Delete { .. } => "delete",
        }
    }
}

/// Buffered, append-only journal
pub struct UndoLog {
    path: PathBuf,
    buffer: Vec<UndoLogEntry>,
    clock: Arc<dyn Clock>,
}

impl UndoLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, Arc::new(SystemClock))
    }

    pub fn with_clock(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            buffer: Vec::new(),
            clock,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries recorded since the last save
    pub fn pending(&self) -> &[UndoLogEntry] {
        &self.buffer
    }

    pub fn log_rename(&mut self, src: &str, dst: &str) {
        self.push(UndoOperation::Rename {
            src: src.to_string(),
            dst: dst.to_string(),
        });
    }

    pub fn log_write(&mut self, path: &str, had_previous: bool, previous_size: u64) {
        self.push(UndoOperation::Write {
            path: path.to_string(),
            had_previous,
            previous_size,
        });
    }

    pub fn log_delete(&mut self, path: &str) {
        self.push(UndoOperation::Delete {
            path: path.to_string(),
        });
    }

    fn push(&mut self, operation: UndoOperation) {
        self.buffer.push(UndoLogEntry {
            timestamp: self.clock.now(),
            operation,
        });
    }

    /// Append buffered entries to the journal and clear the buffer
    ///
    /// Returns the number of entries written. An empty buffer leaves the file
    /// untouched.
    pub async fn save(&mut self) -> Result<usize> {
        if self.buffer.is_empty() {
            return Ok(0);
        }

        let mut lines = String::new();
        for entry in &self.buffer {
            lines.push_str(&serde_json::to_string(entry)?);
            lines.push('\n');
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(lines.as_bytes()).await?;
        file.flush().await?;

        let written = self.buffer.len();
        self.buffer.clear();
        debug!(path = %self.path.display(), entries = written, "Undo journal saved");
        Ok(written)
    }

    /// Read the whole journal in order
    ///
    /// A missing journal is an empty history. Malformed lines are skipped.
    pub async fn read_all(&self) -> Result<Vec<UndoLogEntry>> {
        read_journal(&self.path).await
    }
}

/// Parse a journal file
pub async fn read_journal(path: &Path) -> Result<Vec<UndoLogEntry>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut entries = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<UndoLogEntry>(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(
                path = %path.display(),
                line = index + 1,
                error = %e,
                "Skipping malformed journal line"
            ),
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::time::FixedClock;
    use chrono::TimeZone;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = UndoLogEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            operation: UndoOperation::Rename {
                src: "a".to_string(),
                dst: "b".to_string(),
            },
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["operation"], "rename");
        assert_eq!(value["src"], "a");
        assert_eq!(value["dst"], "b");
        assert!(value["timestamp"].as_str().unwrap().starts_with("2024-05-01T12:00:00"));

        let write = serde_json::to_value(UndoLogEntry {
            timestamp: entry.timestamp,
            operation: UndoOperation::Write {
                path: "Artist/Album/cover.jpg".to_string(),
                had_previous: true,
                previous_size: 1024,
            },
        })
        .unwrap();
        assert_eq!(write["operation"], "write");
        assert_eq!(write["had_previous"], true);
        assert_eq!(write["previous_size"], 1024);
    }

    #[tokio::test]
    async fn test_save_appends_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("undo_log.jsonl");

        let mut log = UndoLog::with_clock(&path, clock());
        log.log_rename("A/Old", "A/New");
        log.log_write("A/New/cover.jpg", false, 0);
        assert_eq!(log.save().await.unwrap(), 2);
        assert!(log.pending().is_empty());

        log.log_delete("A/New/junk.txt");
        assert_eq!(log.save().await.unwrap(), 1);

        let entries = log.read_all().await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].operation.name(), "rename");
        assert_eq!(entries[1].operation.name(), "write");
        assert_eq!(
            entries[2].operation,
            UndoOperation::Delete {
                path: "A/New/junk.txt".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_save_does_not_touch_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("undo_log.jsonl");

        let mut log = UndoLog::new(&path);
        assert_eq!(log.save().await.unwrap(), 0);
        assert!(!path.exists());
        assert!(log.read_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("undo_log.jsonl");
        std::fs::write(
            &path,
            concat!(
                "{\"timestamp\":\"2024-05-01T12:00:00Z\",\"operation\":\"delete\",\"path\":\"x\"}\n",
                "not json\n",
                "\n",
                "{\"timestamp\":\"2024-05-01T12:00:01Z\",\"operation\":\"rename\",\"src\":\"a\",\"dst\":\"b\"}\n",
            ),
        )
        .unwrap();

        let entries = read_journal(&path).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].operation.name(), "rename");
    }
}
