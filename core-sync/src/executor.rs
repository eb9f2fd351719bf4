//! Rename Execution and Journaled Writes
//!
//! Applies planned [`RenameAction`]s to the share. Folder renames always run
//! before file renames so that file actions, which are addressed under the
//! new album path, find their source. Destinations are never overwritten.
//!
//! Every applied mutation is recorded in the [`UndoLog`]; in dry-run mode the
//! intended change is only logged and counted.

use std::sync::Arc;

use bridge_traits::error::BridgeError;
use bridge_traits::storage::RemoteFileSystem;
use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::paths;
use crate::planner::{ActionKind, RenameAction};
use crate::undo_log::UndoLog;

/// Outcome of executing a batch of actions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub success_count: usize,
    pub error_count: usize,
    /// Actions that were applied (or would have been, in dry-run), in execution order
    pub applied: Vec<RenameAction>,
}

impl ExecutionReport {
    /// Album path after the batch, given where it started
    pub fn album_path_after(&self, album_path: &str) -> String {
        self.applied
            .iter()
            .find(|a| a.kind.is_folder() && a.src == album_path)
            .map(|a| a.dst.clone())
            .unwrap_or_else(|| album_path.to_string())
    }
}

/// Applies rename actions against a remote file system
pub struct RenameExecutor {
    fs: Arc<dyn RemoteFileSystem>,
    dry_run: bool,
}

impl RenameExecutor {
    pub fn new(fs: Arc<dyn RemoteFileSystem>, dry_run: bool) -> Self {
        Self { fs, dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Execute `actions`, folder kinds first
    ///
    /// A failing action is counted and logged; the remaining actions still run.
    pub async fn execute(&self, actions: &[RenameAction], undo_log: &mut UndoLog) -> ExecutionReport {
        let (folders, files): (Vec<&RenameAction>, Vec<&RenameAction>) =
            actions.iter().partition(|a| a.kind.is_folder());

        let mut report = ExecutionReport::default();

        for action in folders.into_iter().chain(files) {
            if self.dry_run {
                info!(kind = action.kind.as_str(), "[DRY RUN] {}", action.description);
                report.success_count += 1;
                report.applied.push(action.clone());
                continue;
            }

            match self.apply(action).await {
                Ok(()) => {
                    info!(kind = action.kind.as_str(), "{}", action.description);
                    undo_log.log_rename(&action.src, &action.dst);
                    report.success_count += 1;
                    report.applied.push(action.clone());
                }
                Err(e) => {
                    warn!(
                        src = %action.src,
                        dst = %action.dst,
                        error = %e,
                        "Rename failed"
                    );
                    report.error_count += 1;
                }
            }
        }

        report
    }

    async fn apply(&self, action: &RenameAction) -> Result<()> {
        if !self.fs.exists(&action.src).await? {
            return Err(SyncError::NotFound {
                path: action.src.clone(),
            });
        }

        if self.fs.exists(&action.dst).await? {
            return Err(SyncError::Collision {
                path: action.dst.clone(),
            });
        }

        if action.kind == ActionKind::ArtistFolder {
            let artist_dir = paths::parent(&action.dst);
            if !artist_dir.is_empty() {
                self.fs.create_dir_all(artist_dir).await?;
            }
        }

        self.fs
            .rename(&action.src, &action.dst)
            .await
            .map_err(|e| match e {
                // Lost a race with another writer
                BridgeError::AlreadyExists(_) => SyncError::Collision {
                    path: action.dst.clone(),
                },
                BridgeError::NotFound(_) => SyncError::NotFound {
                    path: action.src.clone(),
                },
                other => other.into(),
            })
    }
}

/// What a journaled write did to its destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Replaced,
}

/// Writes files on the share, journaling the prior state first
pub struct JournaledWriter {
    fs: Arc<dyn RemoteFileSystem>,
    dry_run: bool,
}

impl JournaledWriter {
    pub fn new(fs: Arc<dyn RemoteFileSystem>, dry_run: bool) -> Self {
        Self { fs, dry_run }
    }

    /// Write `data` to `path`
    ///
    /// The `write` journal entry carrying the previous size is recorded
    /// before the write is issued.
    pub async fn write_file(&self, path: &str, data: Bytes, undo_log: &mut UndoLog) -> Result<WriteOutcome> {
        let previous = match self.fs.metadata(path).await {
            Ok(meta) => Some(meta.size),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e.into()),
        };

        let outcome = if previous.is_some() {
            WriteOutcome::Replaced
        } else {
            WriteOutcome::Created
        };

        if self.dry_run {
            info!(path = %path, bytes = data.len(), ?outcome, "[DRY RUN] Would write file");
            return Ok(outcome);
        }

        undo_log.log_write(path, previous.is_some(), previous.unwrap_or(0));
        self.fs.write_file(path, data).await?;
        debug!(path = %path, ?outcome, "File written");

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::undo_log::UndoOperation;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::storage::{DirEntry, FileMetadata};
    use mockall::mock;
    use mockall::predicate::eq;
    use std::sync::Mutex;

    mock! {
        pub Fs {}

        #[async_trait]
        impl RemoteFileSystem for Fs {
            async fn list_directory(&self, path: &str) -> BridgeResult<Vec<DirEntry>>;
            async fn metadata(&self, path: &str) -> BridgeResult<FileMetadata>;
            async fn read_file(&self, path: &str) -> BridgeResult<Bytes>;
            async fn write_file(&self, path: &str, data: Bytes) -> BridgeResult<()>;
            async fn exists(&self, path: &str) -> BridgeResult<bool>;
            async fn rename(&self, from: &str, to: &str) -> BridgeResult<()>;
            async fn create_dir_all(&self, path: &str) -> BridgeResult<()>;
        }
    }

    fn action(src: &str, dst: &str, kind: ActionKind) -> RenameAction {
        RenameAction {
            src: src.to_string(),
            dst: dst.to_string(),
            kind,
            description: format!("{} -> {}", src, dst),
        }
    }

    fn journal() -> UndoLog {
        UndoLog::new("unused.jsonl")
    }

    /// Existing paths and recorded renames
    fn permissive_fs(existing: &[&str]) -> (MockFs, Arc<Mutex<Vec<(String, String)>>>) {
        let existing: Vec<String> = existing.iter().map(|s| s.to_string()).collect();
        let renames = Arc::new(Mutex::new(Vec::new()));

        let mut fs = MockFs::new();
        fs.expect_exists()
            .returning(move |path| Ok(existing.iter().any(|e| e == path)));
        let recorded = renames.clone();
        fs.expect_rename().returning(move |from, to| {
            recorded
                .lock()
                .unwrap()
                .push((from.to_string(), to.to_string()));
            Ok(())
        });
        fs.expect_create_dir_all().returning(|_| Ok(()));
        (fs, renames)
    }

    #[tokio::test]
    async fn test_folders_run_first() {
        let (fs, renames) = permissive_fs(&["Artist/old", "Artist/New/a.flac"]);
        let executor = RenameExecutor::new(Arc::new(fs), false);
        let mut log = journal();

        let actions = vec![
            action("Artist/New/a.flac", "Artist/New/01 - A.flac", ActionKind::File),
            action("Artist/old", "Artist/New", ActionKind::AlbumFolder),
        ];
        let report = executor.execute(&actions, &mut log).await;

        assert_eq!(report.success_count, 2);
        assert_eq!(report.error_count, 0);
        let renames = renames.lock().unwrap();
        assert_eq!(renames[0].0, "Artist/old");
        assert_eq!(renames[1].0, "Artist/New/a.flac");
        assert_eq!(log.pending().len(), 2);
        assert_eq!(report.album_path_after("Artist/old"), "Artist/New");
    }

    #[tokio::test]
    async fn test_collision_is_never_forced() {
        let (fs, renames) = permissive_fs(&["A/x.flac", "A/01 - X.flac"]);
        let executor = RenameExecutor::new(Arc::new(fs), false);
        let mut log = journal();

        let report = executor
            .execute(&[action("A/x.flac", "A/01 - X.flac", ActionKind::File)], &mut log)
            .await;

        assert_eq!(report.success_count, 0);
        assert_eq!(report.error_count, 1);
        assert!(renames.lock().unwrap().is_empty());
        assert!(log.pending().is_empty());
    }

    #[tokio::test]
    async fn test_missing_source_is_counted() {
        let (fs, _) = permissive_fs(&[]);
        let executor = RenameExecutor::new(Arc::new(fs), false);
        let mut log = journal();

        let report = executor
            .execute(
                &[
                    action("A/gone.flac", "A/01 - Gone.flac", ActionKind::File),
                    action("A/gone2.flac", "A/02 - Gone.flac", ActionKind::File),
                ],
                &mut log,
            )
            .await;

        assert_eq!(report.error_count, 2);
        assert_eq!(report.success_count, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_continues() {
        let mut fs = MockFs::new();
        fs.expect_exists()
            .with(eq("A/a.flac"))
            .returning(|_| Err(BridgeError::Transport("share offline".to_string())));
        fs.expect_exists()
            .with(eq("A/b.flac"))
            .returning(|_| Ok(true));
        fs.expect_exists()
            .with(eq("A/02 - B.flac"))
            .returning(|_| Ok(false));
        fs.expect_rename().times(1).returning(|_, _| Ok(()));

        let executor = RenameExecutor::new(Arc::new(fs), false);
        let mut log = journal();
        let report = executor
            .execute(
                &[
                    action("A/a.flac", "A/01 - A.flac", ActionKind::File),
                    action("A/b.flac", "A/02 - B.flac", ActionKind::File),
                ],
                &mut log,
            )
            .await;

        assert_eq!(report.error_count, 1);
        assert_eq!(report.success_count, 1);
    }

    #[tokio::test]
    async fn test_artist_folder_creates_parent() {
        let mut fs = MockFs::new();
        fs.expect_exists()
            .returning(|path| Ok(path == "Incoming/Album"));
        fs.expect_create_dir_all()
            .with(eq("Artist"))
            .times(1)
            .returning(|_| Ok(()));
        fs.expect_rename()
            .with(eq("Incoming/Album"), eq("Artist/Album"))
            .times(1)
            .returning(|_, _| Ok(()));

        let executor = RenameExecutor::new(Arc::new(fs), false);
        let mut log = journal();
        let report = executor
            .execute(
                &[action("Incoming/Album", "Artist/Album", ActionKind::ArtistFolder)],
                &mut log,
            )
            .await;

        assert_eq!(report.success_count, 1);
        assert_eq!(
            log.pending()[0].operation,
            UndoOperation::Rename {
                src: "Incoming/Album".to_string(),
                dst: "Artist/Album".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        // No expectations: any call would panic
        let executor = RenameExecutor::new(Arc::new(MockFs::new()), true);
        let mut log = journal();

        let report = executor
            .execute(
                &[
                    action("A/b.flac", "A/02 - B.flac", ActionKind::File),
                    action("A", "B", ActionKind::AlbumFolder),
                ],
                &mut log,
            )
            .await;

        assert_eq!(report.success_count, 2);
        assert_eq!(report.applied[0].kind, ActionKind::AlbumFolder);
        assert!(log.pending().is_empty());
    }

    #[tokio::test]
    async fn test_journaled_write_logs_prior_state() {
        let mut fs = MockFs::new();
        fs.expect_metadata().returning(|_| {
            Ok(FileMetadata {
                size: 2048,
                modified_ms: 0,
                is_directory: false,
            })
        });
        fs.expect_write_file().times(1).returning(|_, _| Ok(()));

        let writer = JournaledWriter::new(Arc::new(fs), false);
        let mut log = journal();
        let outcome = writer
            .write_file("A/cover.jpg", Bytes::from_static(b"jpeg"), &mut log)
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Replaced);
        assert_eq!(
            log.pending()[0].operation,
            UndoOperation::Write {
                path: "A/cover.jpg".to_string(),
                had_previous: true,
                previous_size: 2048
            }
        );
    }

    #[tokio::test]
    async fn test_journaled_write_new_file_and_dry_run() {
        let mut fs = MockFs::new();
        fs.expect_metadata()
            .returning(|p| Err(BridgeError::NotFound(p.to_string())));

        let writer = JournaledWriter::new(Arc::new(fs), true);
        let mut log = journal();
        let outcome = writer
            .write_file("A/01.lrc", Bytes::from_static(b"[00:01]hi"), &mut log)
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Created);
        assert!(log.pending().is_empty());
    }
}
