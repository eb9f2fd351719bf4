//! Remote File System over a mounted share using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{DirEntry, FileMetadata, RemoteFileSystem},
};
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::sync::OnceCell;
use tracing::debug;

/// Remote file system backed by a share mounted into the local namespace
/// (CIFS/SMB, NFS, sshfs, a cloud-drive FUSE mount).
///
/// Relative `/`-separated paths are resolved under `root`. The mount is
/// verified once, on first use, and the result is cached for the lifetime of
/// the value; a missing or unreadable root is reported as
/// [`BridgeError::Transport`] on every call until then.
pub struct MountedShareFileSystem {
    root: PathBuf,
    session: OnceCell<()>,
}

impl MountedShareFileSystem {
    /// Create a file system rooted at the share's mount point
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            session: OnceCell::new(),
        }
    }

    /// Mount point this instance resolves paths against
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn ensure_session(&self) -> Result<()> {
        self.session
            .get_or_try_init(|| async {
                let metadata = fs::metadata(&self.root).await.map_err(|e| {
                    BridgeError::Transport(format!(
                        "share root {} is not reachable: {}",
                        self.root.display(),
                        e
                    ))
                })?;
                if !metadata.is_dir() {
                    return Err(BridgeError::Transport(format!(
                        "share root {} is not a directory",
                        self.root.display()
                    )));
                }
                debug!(root = ?self.root, "Share session established");
                Ok::<(), BridgeError>(())
            })
            .await
            .map(|_| ())
    }

    /// Map a share-relative path onto the local mount
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let mut out = self.root.clone();
        for component in Path::new(path).components() {
            match component {
                Component::Normal(part) => out.push(part),
                Component::RootDir | Component::CurDir => continue,
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(BridgeError::OperationFailed(format!(
                        "path escapes share root: {}",
                        path
                    )));
                }
            }
        }
        Ok(out)
    }

    /// Convert std::io::Error to BridgeError
    fn map_io_error(e: std::io::Error, path: &str) -> BridgeError {
        match e.kind() {
            ErrorKind::NotFound => BridgeError::NotFound(path.to_string()),
            ErrorKind::AlreadyExists => BridgeError::AlreadyExists(path.to_string()),
            ErrorKind::PermissionDenied
            | ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::TimedOut => BridgeError::Transport(format!("{}: {}", path, e)),
            _ => BridgeError::Io(e),
        }
    }
}

#[async_trait]
impl RemoteFileSystem for MountedShareFileSystem {
    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        self.ensure_session().await?;
        let local = self.resolve(path)?;
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(&local)
            .await
            .map_err(|e| Self::map_io_error(e, path))?;

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| Self::map_io_error(e, path))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| Self::map_io_error(e, path))?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_directory: file_type.is_dir(),
            });
        }

        debug!(path = %path, count = entries.len(), "Listed directory");
        Ok(entries)
    }

    async fn metadata(&self, path: &str) -> Result<FileMetadata> {
        self.ensure_session().await?;
        let local = self.resolve(path)?;
        let metadata = fs::metadata(&local)
            .await
            .map_err(|e| Self::map_io_error(e, path))?;

        Ok(FileMetadata {
            size: metadata.len(),
            modified_ms: metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as i64)
                .unwrap_or(0),
            is_directory: metadata.is_dir(),
        })
    }

    async fn read_file(&self, path: &str) -> Result<Bytes> {
        self.ensure_session().await?;
        let local = self.resolve(path)?;
        let data = fs::read(&local)
            .await
            .map_err(|e| Self::map_io_error(e, path))?;
        debug!(path = %path, size = data.len(), "Read file");
        Ok(Bytes::from(data))
    }

    async fn write_file(&self, path: &str, data: Bytes) -> Result<()> {
        self.ensure_session().await?;
        let local = self.resolve(path)?;
        fs::write(&local, data.as_ref())
            .await
            .map_err(|e| Self::map_io_error(e, path))?;
        debug!(path = %path, size = data.len(), "Wrote file");
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        self.ensure_session().await?;
        let local = self.resolve(path)?;
        fs::try_exists(&local)
            .await
            .map_err(|e| Self::map_io_error(e, path))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        self.ensure_session().await?;
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;

        // POSIX rename silently replaces files; refuse instead.
        if fs::try_exists(&target)
            .await
            .map_err(|e| Self::map_io_error(e, to))?
        {
            return Err(BridgeError::AlreadyExists(to.to_string()));
        }

        fs::rename(&source, &target)
            .await
            .map_err(|e| Self::map_io_error(e, from))?;
        debug!(from = %from, to = %to, "Renamed");
        Ok(())
    }

    async fn create_dir_all(&self, path: &str) -> Result<()> {
        self.ensure_session().await?;
        let local = self.resolve(path)?;
        fs::create_dir_all(&local)
            .await
            .map_err(|e| Self::map_io_error(e, path))?;
        debug!(path = %path, "Created directory");
        Ok(())
    }
}
