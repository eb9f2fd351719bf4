//! # Sync & Reconciliation Module
//!
//! Keeps a media tree on a remote share canonical.
//!
//! ## Overview
//!
//! This module manages:
//! - Planning and applying renames toward canonical `Artist/Album (Year) [Format]` names
//! - Journaling every mutation to an append-only undo log
//! - Polling the share for changed files and reconciling the affected albums
//! - Library-wide scan and fix passes
//!
//! ## Components
//!
//! - **Rename Planner** (`planner`): Computes folder and file renames for one album
//! - **Rename Executor** (`executor`): Applies renames folder-first, never overwriting; journaled writes
//! - **Undo Log** (`undo_log`): JSON Lines journal of applied mutations
//! - **Watch State** (`watch_state`): Persisted snapshot of tracked files
//! - **Change Detector** (`detector`): Snapshot diff and affected album set
//! - **Watcher** (`watcher`): Scan/diff/dispatch/persist loop with cancellation
//! - **Album Reconciler** (`reconciler`, `library`): Naming, artwork and lyrics per album

pub mod detector;
pub mod error;
pub mod executor;
pub mod library;
pub mod paths;
pub mod planner;
pub mod reconciler;
pub mod undo_log;
pub mod walker;
pub mod watch_state;
pub mod watcher;

pub use detector::{ChangeDetector, ChangeSet};
pub use error::{Result, SyncError};
pub use executor::{ExecutionReport, JournaledWriter, RenameExecutor, WriteOutcome};
pub use library::{FixStats, ScanStats};
pub use planner::{ActionKind, RenameAction, RenamePlanner};
pub use reconciler::{AlbumReconciler, AlbumReport, Component};
pub use undo_log::{read_journal, UndoLog, UndoLogEntry, UndoOperation};
pub use walker::{scan_tree, TreeScan};
pub use watch_state::{FileState, WatchState};
pub use watcher::{CycleReport, ReconcileCallback, Watcher, WatcherConfig};
