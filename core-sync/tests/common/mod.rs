//! Shared fakes for core-sync integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::storage::{DirEntry, FileMetadata, RemoteFileSystem};
use bytes::Bytes;
use core_metadata::{TagReader, TrackMetadata};
use core_runtime::config::AppConfig;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use tokio::sync::Mutex as AsyncMutex;

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File { data: Bytes, modified_ms: i64 },
}

/// In-memory share
///
/// Directories listed in `failing` answer every listing with a transport
/// error, like a folder the share refuses to open. Those in `failing_once`
/// fail a single time.
pub struct MemoryFs {
    nodes: AsyncMutex<BTreeMap<String, Node>>,
    failing: Mutex<HashSet<String>>,
    failing_once: Mutex<HashSet<String>>,
    clock: AtomicI64,
}

impl MemoryFs {
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(String::new(), Node::Dir);
        Self {
            nodes: AsyncMutex::new(nodes),
            failing: Mutex::new(HashSet::new()),
            failing_once: Mutex::new(HashSet::new()),
            clock: AtomicI64::new(1_700_000_000_000),
        }
    }

    fn tick(&self) -> i64 {
        self.clock.fetch_add(1_000, Ordering::SeqCst)
    }

    fn parent(path: &str) -> &str {
        path.rfind('/').map(|i| &path[..i]).unwrap_or("")
    }

    fn insert_dirs(nodes: &mut BTreeMap<String, Node>, dir: &str) {
        let mut current = String::new();
        for segment in dir.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);
            nodes.entry(current.clone()).or_insert(Node::Dir);
        }
    }

    /// Add a file, creating its parent directories
    pub async fn add_file(&self, path: &str, data: impl Into<Bytes>) {
        let modified_ms = self.tick();
        let mut nodes = self.nodes.lock().await;
        Self::insert_dirs(&mut nodes, Self::parent(path));
        nodes.insert(
            path.to_string(),
            Node::File {
                data: data.into(),
                modified_ms,
            },
        );
    }

    pub async fn add_dir(&self, path: &str) {
        let mut nodes = self.nodes.lock().await;
        Self::insert_dirs(&mut nodes, path);
    }

    pub async fn remove(&self, path: &str) {
        let prefix = format!("{}/", path);
        let mut nodes = self.nodes.lock().await;
        nodes.retain(|k, _| k != path && !k.starts_with(&prefix));
    }

    /// Bump a file's modification time
    pub async fn touch(&self, path: &str) {
        let now = self.tick();
        let mut nodes = self.nodes.lock().await;
        if let Some(Node::File { modified_ms, .. }) = nodes.get_mut(path) {
            *modified_ms = now;
        }
    }

    pub fn fail_listing(&self, dir: &str) {
        self.failing.lock().unwrap().insert(dir.to_string());
    }

    /// Fail only the next listing of `dir`
    pub fn fail_listing_once(&self, dir: &str) {
        self.failing_once.lock().unwrap().insert(dir.to_string());
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.nodes.lock().await.contains_key(path)
    }

    pub async fn file(&self, path: &str) -> Option<Bytes> {
        match self.nodes.lock().await.get(path) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    /// Every file path, sorted
    pub async fn files(&self) -> Vec<String> {
        self.nodes
            .lock()
            .await
            .iter()
            .filter(|(_, n)| matches!(n, Node::File { .. }))
            .map(|(k, _)| k.clone())
            .collect()
    }
}

#[async_trait]
impl RemoteFileSystem for MemoryFs {
    async fn list_directory(&self, path: &str) -> BridgeResult<Vec<DirEntry>> {
        if self.failing.lock().unwrap().contains(path)
            || self.failing_once.lock().unwrap().remove(path)
        {
            return Err(BridgeError::Transport(format!("cannot open {}", path)));
        }

        let nodes = self.nodes.lock().await;
        match nodes.get(path) {
            Some(Node::Dir) => {}
            Some(Node::File { .. }) => {
                return Err(BridgeError::OperationFailed(format!("{} is a file", path)))
            }
            None => return Err(BridgeError::NotFound(path.to_string())),
        }

        Ok(nodes
            .iter()
            .filter(|(k, _)| !k.is_empty() && Self::parent(k) == path)
            .map(|(k, n)| {
                let name = k.rsplit('/').next().unwrap_or(k).to_string();
                match n {
                    Node::Dir => DirEntry::directory(name),
                    Node::File { .. } => DirEntry::file(name),
                }
            })
            .collect())
    }

    async fn metadata(&self, path: &str) -> BridgeResult<FileMetadata> {
        match self.nodes.lock().await.get(path) {
            Some(Node::Dir) => Ok(FileMetadata {
                size: 0,
                modified_ms: 0,
                is_directory: true,
            }),
            Some(Node::File { data, modified_ms }) => Ok(FileMetadata {
                size: data.len() as u64,
                modified_ms: *modified_ms,
                is_directory: false,
            }),
            None => Err(BridgeError::NotFound(path.to_string())),
        }
    }

    async fn read_file(&self, path: &str) -> BridgeResult<Bytes> {
        self.file(path)
            .await
            .ok_or_else(|| BridgeError::NotFound(path.to_string()))
    }

    async fn write_file(&self, path: &str, data: Bytes) -> BridgeResult<()> {
        let modified_ms = self.tick();
        let mut nodes = self.nodes.lock().await;
        if !matches!(nodes.get(Self::parent(path)), Some(Node::Dir)) {
            return Err(BridgeError::NotFound(Self::parent(path).to_string()));
        }
        nodes.insert(path.to_string(), Node::File { data, modified_ms });
        Ok(())
    }

    async fn exists(&self, path: &str) -> BridgeResult<bool> {
        Ok(self.nodes.lock().await.contains_key(path))
    }

    async fn rename(&self, from: &str, to: &str) -> BridgeResult<()> {
        let mut nodes = self.nodes.lock().await;
        if !nodes.contains_key(from) {
            return Err(BridgeError::NotFound(from.to_string()));
        }
        if nodes.contains_key(to) {
            return Err(BridgeError::AlreadyExists(to.to_string()));
        }
        if !matches!(nodes.get(Self::parent(to)), Some(Node::Dir)) {
            return Err(BridgeError::NotFound(Self::parent(to).to_string()));
        }

        let prefix = format!("{}/", from);
        let moved: Vec<String> = nodes
            .keys()
            .filter(|k| k.as_str() == from || k.starts_with(&prefix))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                let new = format!("{}{}", to, &old[from.len()..]);
                nodes.insert(new, node);
            }
        }
        Ok(())
    }

    async fn create_dir_all(&self, path: &str) -> BridgeResult<()> {
        let mut nodes = self.nodes.lock().await;
        Self::insert_dirs(&mut nodes, path);
        Ok(())
    }
}

/// Tag reader keyed by file contents
///
/// Test files hold a short key (`b"wall-03"`) instead of audio; the key maps
/// to the metadata the file "carries", so tags follow the file across renames.
#[derive(Default)]
pub struct StubTagReader {
    tags: HashMap<String, TrackMetadata>,
}

impl StubTagReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, meta: TrackMetadata) -> Self {
        self.tags.insert(key.to_string(), meta);
        self
    }
}

impl TagReader for StubTagReader {
    fn read(&self, data: &[u8], path_hint: &str) -> Option<TrackMetadata> {
        let key = std::str::from_utf8(data).ok()?;
        self.tags.get(key).map(|meta| TrackMetadata {
            file_path: path_hint.to_string(),
            ..meta.clone()
        })
    }
}

/// `The Wall` track metadata, FLAC 16/44.1
pub fn wall_track(number: u32, title: &str) -> TrackMetadata {
    TrackMetadata {
        title: Some(title.to_string()),
        artist: Some("Pink Floyd".to_string()),
        album_artist: Some("Pink Floyd".to_string()),
        album: Some("The Wall".to_string()),
        year: Some(1979),
        track_number: Some(number),
        format: Some("FLAC".to_string()),
        bit_depth: Some(16),
        sample_rate: Some(44_100),
        ..Default::default()
    }
}

pub const WALL_FOLDER: &str = "Pink Floyd/The Wall (1979) [FLAC 16-44]";

/// Configuration with journal and state files under `dir`
pub fn test_config(dir: &Path, dry_run: bool) -> AppConfig {
    AppConfig::builder()
        .share_root(dir.join("share"))
        .undo_log_path(dir.join("undo_log.jsonl"))
        .watch_state_path(dir.join(".watch_state.json"))
        .cover_min_dimension(100)
        .cover_min_size(0)
        .dry_run(dry_run)
        .build()
        .unwrap()
}

/// [`test_config`] with misfiled albums moved under their artist
pub fn relocating_config(dir: &Path) -> AppConfig {
    AppConfig {
        relocate_artists: true,
        ..test_config(dir, false)
    }
}
