//! Library-wide passes over the `Artist/Album` layout
//!
//! `scan` reports what is off without touching anything; `fix` runs the
//! [`AlbumReconciler`] over every album. Both walk exactly two levels below
//! the library root and stop after `limit` albums (0 = all).

use core_metadata::artwork::should_replace_cover;
use core_metadata::detect_naming_issues;
use tracing::{debug, info, instrument, warn};

use crate::error::Result;
use crate::paths;
use crate::reconciler::{AlbumReconciler, Component};

/// Read-only library report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub albums_scanned: usize,
    pub tracks_scanned: usize,
    pub naming_issues: usize,
    pub missing_covers: usize,
    pub low_quality_covers: usize,
    pub missing_lyrics: usize,
}

/// Totals of a fix pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixStats {
    pub albums_processed: usize,
    pub tracks_processed: usize,
    pub renames: usize,
    pub covers_added: usize,
    pub covers_replaced: usize,
    pub lyrics_added: usize,
    pub errors: usize,
}

impl AlbumReconciler {
    /// Album directories two levels below `root`, sorted by name
    async fn album_dirs(&self, root: &str) -> Result<Vec<String>> {
        let mut artists: Vec<_> = self
            .fs
            .list_directory(root)
            .await?
            .into_iter()
            .filter(|e| e.is_directory)
            .map(|e| e.name)
            .collect();
        artists.sort();

        let mut albums = Vec::new();
        for artist in artists {
            let artist_path = paths::join(root, &artist);
            let mut entries = match self.fs.list_directory(&artist_path).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(artist = %artist, error = %e, "Skipping unreadable artist folder");
                    continue;
                }
            };
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            albums.extend(
                entries
                    .into_iter()
                    .filter(|e| e.is_directory)
                    .map(|e| paths::join(&artist_path, &e.name)),
            );
        }

        Ok(albums)
    }

    /// Report naming, artwork and lyrics problems without changing anything
    #[instrument(skip(self), fields(component = %self.component))]
    pub async fn scan_library(&self, root: &str, limit: usize) -> Result<ScanStats> {
        let mut stats = ScanStats::default();

        for album_path in self.album_dirs(root).await? {
            if limit > 0 && stats.albums_scanned >= limit {
                break;
            }

            let listing = match self.list_album(&album_path).await {
                Ok(listing) => listing,
                Err(e) => {
                    warn!(album = %album_path, error = %e, "Skipping unreadable album");
                    continue;
                }
            };
            let Some(first) = listing.tracks.first() else {
                continue;
            };

            stats.albums_scanned += 1;
            stats.tracks_scanned += listing.tracks.len();

            if self.component.includes(Component::Naming) {
                match self.read_metadata(first).await {
                    Some(meta) => {
                        let result = self.names().analyze_current_name(first, &meta);
                        if !result.is_canonical() {
                            info!(album = %album_path, changes = ?result.changes, "Naming issue");
                            stats.naming_issues += 1;
                        }
                    }
                    None => warn!(album = %album_path, "No readable tags, naming not checked"),
                }

                for track in &listing.tracks {
                    let issues = detect_naming_issues(paths::file_name(track));
                    if !issues.is_empty() {
                        debug!(track = %paths::file_name(track), ?issues, "Suspicious file name");
                    }
                }
            }

            if self.component.includes(Component::Artwork) {
                match &listing.cover {
                    None => stats.missing_covers += 1,
                    Some(cover) => match self.fs.read_file(cover).await {
                        Ok(data) => {
                            if should_replace_cover(Some(data.as_ref()), &self.thresholds).should_replace() {
                                stats.low_quality_covers += 1;
                            }
                        }
                        Err(e) => {
                            warn!(cover = %cover, error = %e, "Failed to read cover");
                            stats.low_quality_covers += 1;
                        }
                    },
                }
            }

            if self.component.includes(Component::Lyrics) {
                stats.missing_lyrics += listing
                    .tracks
                    .iter()
                    .filter(|t| !listing.has_lyrics_for(t))
                    .count();
            }
        }

        info!(
            albums = stats.albums_scanned,
            tracks = stats.tracks_scanned,
            naming_issues = stats.naming_issues,
            missing_covers = stats.missing_covers,
            low_quality_covers = stats.low_quality_covers,
            missing_lyrics = stats.missing_lyrics,
            "Library scan complete"
        );
        Ok(stats)
    }

    /// Reconcile every album in the library
    #[instrument(skip(self), fields(component = %self.component, dry_run = self.is_dry_run()))]
    pub async fn fix_library(&self, root: &str, limit: usize) -> Result<FixStats> {
        let mut stats = FixStats::default();

        for album_path in self.album_dirs(root).await? {
            if limit > 0 && stats.albums_processed >= limit {
                break;
            }

            match self.process_album(&album_path).await {
                Ok(report) if report.tracks == 0 => {}
                Ok(report) => {
                    stats.albums_processed += 1;
                    stats.tracks_processed += report.tracks;
                    stats.renames += report.renames;
                    stats.covers_added += report.covers_added;
                    stats.covers_replaced += report.covers_replaced;
                    stats.lyrics_added += report.lyrics_added;
                    stats.errors += report.errors();
                }
                Err(e) => {
                    warn!(album = %album_path, error = %e, "Album skipped");
                    stats.albums_processed += 1;
                    stats.errors += 1;
                }
            }
        }

        info!(
            albums = stats.albums_processed,
            tracks = stats.tracks_processed,
            renames = stats.renames,
            covers_added = stats.covers_added,
            covers_replaced = stats.covers_replaced,
            lyrics_added = stats.lyrics_added,
            errors = stats.errors,
            "Library fix complete"
        );
        Ok(stats)
    }
}
