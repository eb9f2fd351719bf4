//! Tree Walker
//!
//! Collects size and modification time of every tracked file under a share
//! directory. The walk uses an explicit work list, so depth is bounded only
//! by memory.

use std::collections::BTreeMap;

use bridge_traits::storage::RemoteFileSystem;
use tracing::{debug, warn};

use crate::error::Result;
use crate::paths;
use crate::watch_state::FileState;

/// Result of walking a tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeScan {
    pub files: BTreeMap<String, FileState>,
    /// Directories below the root that could not be listed
    pub unreadable_dirs: Vec<String>,
}

/// Walk `root` and stat every file accepted by `is_tracked`
///
/// Failing to list `root` itself fails the walk. A subdirectory that cannot
/// be listed is skipped alone and recorded in
/// [`TreeScan::unreadable_dirs`]; a file whose stat fails is skipped.
pub async fn scan_tree<F>(fs: &dyn RemoteFileSystem, root: &str, is_tracked: F) -> Result<TreeScan>
where
    F: Fn(&str) -> bool,
{
    let mut scan = TreeScan::default();
    let mut pending = vec![root.to_string()];

    while let Some(dir) = pending.pop() {
        let entries = match fs.list_directory(&dir).await {
            Ok(entries) => entries,
            Err(e) if dir == root => return Err(e.into()),
            Err(e) => {
                warn!(dir = %dir, error = %e, "Skipping unreadable directory");
                scan.unreadable_dirs.push(dir);
                continue;
            }
        };

        for entry in entries {
            let path = paths::join(&dir, &entry.name);

            if entry.is_directory {
                pending.push(path);
                continue;
            }

            if !is_tracked(&entry.name) {
                continue;
            }

            match fs.metadata(&path).await {
                Ok(meta) => {
                    scan.files.insert(
                        path.clone(),
                        FileState {
                            path,
                            size: meta.size,
                            modified: meta.modified_ms,
                        },
                    );
                }
                Err(e) => debug!(path = %path, error = %e, "Stat failed, skipping file this cycle"),
            }
        }
    }

    scan.unreadable_dirs.sort();
    Ok(scan)
}
