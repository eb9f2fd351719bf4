//! Media manager workspace facade.
//!
//! Re-exports the workspace crates so a host can depend on one package and
//! reach the whole public API. The `desktop-shims` feature (on by default)
//! adds the mounted-share [`RemoteFileSystem`](bridge_traits::RemoteFileSystem)
//! implementation.

pub use bridge_traits;
pub use core_metadata;
pub use core_runtime;
pub use core_sync;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop;

pub use core_metadata::{LoftyTagReader, NameGenerator, NamingConfig, TagReader, TrackMetadata};
pub use core_runtime::{AppConfig, AppConfigBuilder};
pub use core_sync::{
    AlbumReconciler, Component, RenameExecutor, RenamePlanner, UndoLog, Watcher, WatcherConfig,
};
