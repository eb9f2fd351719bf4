use bridge_traits::error::BridgeError;
use core_metadata::MetadataError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Remote storage error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Source does not exist: {path}")]
    NotFound { path: String },

    #[error("Destination already exists: {path}")]
    Collision { path: String },

    #[error("Album {path} skipped: {reason}")]
    AlbumSkipped { path: String, reason: String },

    #[error("Corrupt state file: {0}")]
    StateCorruption(String),

    #[error("Reconciliation failed: {0}")]
    Reconcile(String),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Whether the remote share itself was unreachable
    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Bridge(e) if e.is_transport())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
