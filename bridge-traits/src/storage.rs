//! Remote File System Abstraction
//!
//! The media tree lives on storage that offers no change notifications (an SMB
//! share, a NAS export, a mounted cloud drive). Everything the core needs from
//! it is captured by [`RemoteFileSystem`].
//!
//! Paths handed to the trait are relative to the share root and use `/` as the
//! separator (`"Artist/Album/01 - Song.flac"`). The empty string addresses the
//! root itself. Implementations translate to whatever their transport expects.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Entry returned by a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (no directory component)
    pub name: String,
    /// Whether the entry is a directory
    pub is_directory: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
        }
    }
}

/// File metadata information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    pub size: u64,
    /// Last modification time in milliseconds since the Unix epoch
    pub modified_ms: i64,
    pub is_directory: bool,
}

/// Remote file system access
///
/// Every method distinguishes an unreachable or unauthenticated remote
/// ([`BridgeError::Transport`](crate::error::BridgeError::Transport)) from a
/// missing path ([`BridgeError::NotFound`](crate::error::BridgeError::NotFound)).
///
/// Implementations establish their session lazily on first use and reuse it
/// for the lifetime of the value.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::RemoteFileSystem;
///
/// async fn count_entries(fs: &dyn RemoteFileSystem) -> bridge_traits::error::Result<usize> {
///     Ok(fs.list_directory("").await?.len())
/// }
/// ```
#[async_trait]
pub trait RemoteFileSystem: Send + Sync {
    /// List the immediate children of a directory
    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>>;

    /// Get size and modification time of a file or directory
    async fn metadata(&self, path: &str) -> Result<FileMetadata>;

    /// Read entire file contents into memory
    async fn read_file(&self, path: &str) -> Result<Bytes>;

    /// Write data to a file, replacing any previous content
    async fn write_file(&self, path: &str, data: Bytes) -> Result<()>;

    /// Check if a file or directory exists
    async fn exists(&self, path: &str) -> Result<bool>;

    /// Rename or move a file or directory
    ///
    /// Implementations must not silently replace an existing destination.
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    /// Create a directory and all missing parents
    async fn create_dir_all(&self, path: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_entry_constructors() {
        let file = DirEntry::file("01 - Song.flac");
        assert!(!file.is_directory);
        assert_eq!(file.name, "01 - Song.flac");

        let dir = DirEntry::directory("Album");
        assert!(dir.is_directory);
    }

    #[test]
    fn test_file_metadata() {
        let metadata = FileMetadata {
            size: 1024,
            modified_ms: 1_234_567_900_000,
            is_directory: false,
        };

        assert_eq!(metadata.size, 1024);
        assert!(!metadata.is_directory);
    }
}
