//! # Host Bridge Traits
//!
//! Abstractions over the outside world that the reconciliation core depends on.
//!
//! ## Overview
//!
//! The core never talks to a share, a clock or a disk directly. Each capability
//! is a trait here, with production implementations living in
//! `bridge-desktop` and in-memory fakes living next to the tests that need them.
//!
//! ## Traits
//!
//! - [`RemoteFileSystem`](storage::RemoteFileSystem) - Listing, stat, read, write and
//!   rename on the remote media tree
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Implementations
//! should:
//!
//! - Map unreachable hosts and rejected credentials to `BridgeError::Transport`
//! - Map missing paths to `BridgeError::NotFound`
//! - Include the offending path in the message
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared behind
//! an `Arc` across async tasks.

pub mod error;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use storage::{DirEntry, FileMetadata, RemoteFileSystem};
pub use time::{Clock, FixedClock, SystemClock};
