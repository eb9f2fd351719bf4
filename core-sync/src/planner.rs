//! Rename Planning
//!
//! Turns an album directory plus its tag metadata into the list of renames
//! that would make it canonical. Planning is pure: nothing is touched on the
//! share, and the output is an unordered bag of [`RenameAction`]s that the
//! [`RenameExecutor`](crate::executor::RenameExecutor) orders and applies.

use std::collections::HashMap;

use core_metadata::{NameGenerator, TrackMetadata};

use crate::paths;

/// What a rename moves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Album folder renamed in place
    AlbumFolder,
    /// Album folder moved under a different artist folder
    ArtistFolder,
    /// Track file renamed inside its album
    File,
}

impl ActionKind {
    pub fn is_folder(&self) -> bool {
        matches!(self, ActionKind::AlbumFolder | ActionKind::ArtistFolder)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::AlbumFolder => "album_folder",
            ActionKind::ArtistFolder => "artist_folder",
            ActionKind::File => "file",
        }
    }
}

/// A single planned rename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameAction {
    pub src: String,
    pub dst: String,
    pub kind: ActionKind,
    pub description: String,
}

/// Plans renames for one album at a time
pub struct RenamePlanner {
    names: NameGenerator,
    /// Library root albums are relocated under; `None` disables relocation
    library_root: Option<String>,
}

impl RenamePlanner {
    pub fn new(names: NameGenerator) -> Self {
        Self {
            names,
            library_root: None,
        }
    }

    /// Move albums filed under the wrong artist to `<root>/<artist>/<album>`
    ///
    /// Only leaf albums exactly two levels below the root are moved. Anything
    /// else keeps its parent and gets an in-place album folder rename.
    pub fn with_artist_relocation(mut self, library_root: impl Into<String>) -> Self {
        self.library_root = Some(library_root.into());
        self
    }

    pub fn names(&self) -> &NameGenerator {
        &self.names
    }

    /// Plan renames for the album at `album_path`
    ///
    /// `tracks` are the share paths of the audio files currently in the album.
    /// Without `track_metadata` only the folder action (if any) is produced;
    /// tracks missing from the map are left alone. An album directory with
    /// subdirectories is never relocated.
    pub fn plan(
        &self,
        album_path: &str,
        tracks: &[String],
        album_meta: &TrackMetadata,
        track_metadata: Option<&HashMap<String, TrackMetadata>>,
        has_subdirectories: bool,
    ) -> Vec<RenameAction> {
        let mut actions = Vec::new();

        let album_folder = self.names.album_folder(album_meta);
        let artist_folder = self.names.artist_folder(album_meta);
        let current_album = paths::file_name(album_path);
        let current_parent = paths::parent(album_path);

        let mut target_album = album_path.to_string();

        let relocate_to = self
            .library_root
            .as_deref()
            .filter(|root| !has_subdirectories && is_artist_level(root, current_parent))
            .filter(|_| paths::file_name(current_parent) != artist_folder)
            .map(|root| paths::join(&paths::join(root, &artist_folder), &album_folder));

        match relocate_to {
            Some(dst) if dst != album_path => {
                actions.push(RenameAction {
                    description: format!("Move album: '{}' -> '{}'", album_path, dst),
                    src: album_path.to_string(),
                    dst: dst.clone(),
                    kind: ActionKind::ArtistFolder,
                });
                target_album = dst;
            }
            _ if current_album != album_folder => {
                let dst = paths::join(current_parent, &album_folder);
                actions.push(RenameAction {
                    description: format!(
                        "Rename album folder: '{}' -> '{}'",
                        current_album, album_folder
                    ),
                    src: album_path.to_string(),
                    dst: dst.clone(),
                    kind: ActionKind::AlbumFolder,
                });
                target_album = dst;
            }
            _ => {}
        }

        let Some(track_metadata) = track_metadata else {
            return actions;
        };

        for track in tracks {
            let Some(meta) = track_metadata.get(track) else {
                continue;
            };

            let current_name = paths::file_name(track);
            let canonical = self.names.track_filename(meta);
            if current_name == canonical {
                continue;
            }

            // Folder renames run first, so the file is addressed at the new location
            let src = paths::join(&target_album, current_name);
            let dst = paths::join(&target_album, &canonical);
            if src == dst {
                continue;
            }

            actions.push(RenameAction {
                description: format!("Rename file: '{}' -> '{}'", current_name, canonical),
                src,
                dst,
                kind: ActionKind::File,
            });
        }

        actions
    }
}

/// Whether `dir` is an artist folder directly below `root`
fn is_artist_level(root: &str, dir: &str) -> bool {
    dir != root && paths::parent(dir) == root
}
