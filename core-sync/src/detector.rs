//! Change Detection
//!
//! Diffs a fresh observation of the tree against the previous snapshot and
//! brings the snapshot up to date.

use std::collections::{BTreeMap, BTreeSet};

use crate::paths;
use crate::watch_state::{FileState, WatchState};

/// Files that changed since the previous snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub new: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    pub fn total(&self) -> usize {
        self.new.len() + self.modified.len() + self.deleted.len()
    }

    /// Parent directories of new and modified files, deduplicated and sorted
    ///
    /// Deleted files do not make an album dirty.
    pub fn affected_albums(&self) -> Vec<String> {
        self.new
            .iter()
            .chain(&self.modified)
            .map(|path| paths::parent(path).to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Stateless snapshot differ
pub struct ChangeDetector;

impl ChangeDetector {
    /// Compare `observed` with `state` and replace the snapshot's files
    ///
    /// After the call `state.known_files` equals `observed`.
    pub fn diff(state: &mut WatchState, observed: BTreeMap<String, FileState>) -> ChangeSet {
        let mut changes = ChangeSet::default();

        for (path, current) in &observed {
            match state.known_files.get(path) {
                None => changes.new.push(path.clone()),
                Some(previous) if previous.differs_from(current) => {
                    changes.modified.push(path.clone())
                }
                Some(_) => {}
            }
        }

        changes.deleted = state
            .known_files
            .keys()
            .filter(|path| !observed.contains_key(*path))
            .cloned()
            .collect();

        state.known_files = observed;
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed(files: &[(&str, u64, i64)]) -> BTreeMap<String, FileState> {
        files
            .iter()
            .map(|(path, size, modified)| {
                (
                    path.to_string(),
                    FileState {
                        path: path.to_string(),
                        size: *size,
                        modified: *modified,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_unchanged_tree_has_no_changes() {
        let tree = observed(&[("A/B/01.flac", 10, 1), ("A/B/02.flac", 20, 2)]);
        let mut state = WatchState {
            last_scan: None,
            known_files: tree.clone(),
        };

        let changes = ChangeDetector::diff(&mut state, tree.clone());
        assert!(changes.is_empty());
        assert!(changes.affected_albums().is_empty());
        assert_eq!(state.known_files, tree);
    }

    #[test]
    fn test_new_modified_deleted() {
        let mut state = WatchState {
            last_scan: None,
            known_files: observed(&[("A/B/01.flac", 10, 1), ("A/C/01.flac", 5, 1)]),
        };

        let changes = ChangeDetector::diff(
            &mut state,
            observed(&[("A/B/01.flac", 10, 9), ("A/B/02.flac", 20, 2), ("X/Y/1.mp3", 1, 1)]),
        );

        assert_eq!(changes.new, vec!["A/B/02.flac", "X/Y/1.mp3"]);
        assert_eq!(changes.modified, vec!["A/B/01.flac"]);
        assert_eq!(changes.deleted, vec!["A/C/01.flac"]);
        assert_eq!(changes.total(), 4);
        assert_eq!(changes.affected_albums(), vec!["A/B", "X/Y"]);
        assert!(!state.known_files.contains_key("A/C/01.flac"));
        assert_eq!(state.len(), 3);
    }
}
