//! Polling Watch Loop
//!
//! The share offers no change notifications, so the watcher polls:
//!
//! ```text
//! Scan -> Diff -> Dispatch -> Persist -> Sleep -> Scan ...
//! ```
//!
//! A cycle always runs to completion. Cancellation is observed between
//! cycles and cuts the sleep short.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::storage::RemoteFileSystem;
use bridge_traits::time::{Clock, SystemClock};
use core_runtime::config::AppConfig;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::detector::ChangeDetector;
use crate::error::Result;
use crate::paths;
use crate::walker::scan_tree;
use crate::watch_state::WatchState;

/// Receives the albums touched in a cycle
#[async_trait]
pub trait ReconcileCallback: Send + Sync {
    /// Called once per cycle with a non-empty, deduplicated album list
    async fn reconcile(&self, albums: &[String]) -> Result<()>;
}

/// Summary of one watch cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub new_files: Vec<String>,
    pub modified_files: Vec<String>,
    pub deleted_files: Vec<String>,
    pub albums_affected: Vec<String>,
    pub unreadable_dirs: Vec<String>,
}

impl CycleReport {
    pub fn has_changes(&self) -> bool {
        !(self.new_files.is_empty() && self.modified_files.is_empty() && self.deleted_files.is_empty())
    }
}

/// Watcher settings
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Share directory to watch, `""` for the whole share
    pub root: String,
    /// Tracked extensions, lowercase with leading dot
    pub extensions: Vec<String>,
    pub poll_interval: Duration,
    pub state_path: PathBuf,
}

impl From<&AppConfig> for WatcherConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            root: String::new(),
            extensions: config.audio_extensions.clone(),
            poll_interval: config.poll_interval,
            state_path: config.watch_state_path.clone(),
        }
    }
}

/// Polls the share and dispatches changed albums
pub struct Watcher {
    fs: Arc<dyn RemoteFileSystem>,
    config: WatcherConfig,
    state: WatchState,
    callback: Option<Arc<dyn ReconcileCallback>>,
    clock: Arc<dyn Clock>,
}

impl Watcher {
    /// Create a watcher, loading the persisted snapshot
    pub async fn new(fs: Arc<dyn RemoteFileSystem>, config: WatcherConfig) -> Result<Self> {
        let state = WatchState::load(&config.state_path).await?;
        info!(
            state = %config.state_path.display(),
            known_files = state.len(),
            "Watcher initialized"
        );

        Ok(Self {
            fs,
            config,
            state,
            callback: None,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_callback(mut self, callback: Arc<dyn ReconcileCallback>) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current snapshot
    pub fn state(&self) -> &WatchState {
        &self.state
    }

    /// Run a single cycle
    ///
    /// Scan failures and persistence failures are returned; callback failures
    /// are only logged.
    #[instrument(skip(self), fields(root = %self.config.root))]
    pub async fn run_once(&mut self) -> Result<CycleReport> {
        // Phase 1: scan
        let extensions = &self.config.extensions;
        let scan = scan_tree(self.fs.as_ref(), &self.config.root, |name| {
            paths::has_extension(name, extensions)
        })
        .await?;
        debug!(files = scan.files.len(), "Scan complete");

        // Phase 2: diff
        let changes = ChangeDetector::diff(&mut self.state, scan.files);
        let albums = changes.affected_albums();

        if changes.is_empty() {
            debug!("No changes detected");
        } else {
            info!(
                new = changes.new.len(),
                modified = changes.modified.len(),
                deleted = changes.deleted.len(),
                albums = albums.len(),
                "Changes detected"
            );
        }

        // Phase 3: dispatch
        if !albums.is_empty() {
            if let Some(callback) = &self.callback {
                if let Err(e) = callback.reconcile(&albums).await {
                    error!(error = %e, albums = albums.len(), "Reconciliation failed");
                }
            }
        }

        // Phase 4: persist
        self.state.last_scan = Some(self.clock.now());
        self.state.save(&self.config.state_path).await?;

        Ok(CycleReport {
            new_files: changes.new,
            modified_files: changes.modified,
            deleted_files: changes.deleted,
            albums_affected: albums,
            unreadable_dirs: scan.unreadable_dirs,
        })
    }

    /// Poll until `cancel` fires
    ///
    /// Returns the number of cycles run.
    pub async fn run(&mut self, cancel: CancellationToken) -> usize {
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            "Starting watch loop"
        );

        let mut cycles = 0;
        loop {
            if cancel.is_cancelled() {
                break;
            }

            cycles += 1;
            match self.run_once().await {
                Ok(report) if !report.unreadable_dirs.is_empty() => warn!(
                    cycle = cycles,
                    unreadable = report.unreadable_dirs.len(),
                    "Cycle finished with unreadable directories"
                ),
                Ok(_) => {}
                Err(e) => error!(cycle = cycles, error = %e, "Watch cycle failed"),
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!(cycles, "Watch loop stopped");
        cycles
    }
}
