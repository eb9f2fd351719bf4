//! Album Reconciliation
//!
//! Brings one album directory in line with its tags: canonical folder and
//! file names, a decent `cover.jpg`, and `.lrc` files for embedded lyrics.
//! Used as the watcher's [`ReconcileCallback`] and by the `fix` pass.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_traits::storage::RemoteFileSystem;
use bytes::Bytes;
use core_metadata::artwork::{
    analyze_cover, cover_jpeg_bytes, is_improvement, should_replace_cover, COVER_FILE_NAME,
    COVER_FILE_NAMES,
};
use core_metadata::{
    lrc_filename, CoverThresholds, NameGenerator, NamingConfig, TagReader, TrackMetadata,
};
use core_runtime::config::AppConfig;
use core_runtime::logging::strip_path;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, SyncError};
use crate::executor::{ExecutionReport, JournaledWriter, RenameExecutor};
use crate::paths;
use crate::planner::{ActionKind, RenamePlanner};
use crate::undo_log::UndoLog;
use crate::watcher::ReconcileCallback;

/// Which parts of an album to reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Component {
    Naming,
    Artwork,
    Lyrics,
    #[default]
    All,
}

impl Component {
    pub fn includes(self, other: Component) -> bool {
        self == Component::All || self == other
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::Naming => "naming",
            Component::Artwork => "artwork",
            Component::Lyrics => "lyrics",
            Component::All => "all",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Component {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "naming" => Ok(Component::Naming),
            "artwork" => Ok(Component::Artwork),
            "lyrics" => Ok(Component::Lyrics),
            "all" => Ok(Component::All),
            other => Err(format!("Unknown component: {}", other)),
        }
    }
}

/// What happened to one album
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumReport {
    /// Album path after reconciliation
    pub path: String,
    pub tracks: usize,
    pub renames: usize,
    pub rename_errors: usize,
    pub covers_added: usize,
    pub covers_replaced: usize,
    pub lyrics_added: usize,
    /// Failed cover or lyrics writes
    pub write_errors: usize,
}

impl AlbumReport {
    pub fn errors(&self) -> usize {
        self.rename_errors + self.write_errors
    }
}

/// Entries of an album directory, split by role
#[derive(Debug, Clone, Default)]
pub(crate) struct AlbumListing {
    /// Track share paths, sorted by name
    pub tracks: Vec<String>,
    /// Existing cover, first match in [`COVER_FILE_NAMES`] order
    pub cover: Option<String>,
    /// Names of existing `.lrc` files
    pub lyrics: HashSet<String>,
    /// Album directory holds other directories (discs, stray albums)
    pub has_subdirectories: bool,
}

impl AlbumListing {
    pub fn has_lyrics_for(&self, track: &str) -> bool {
        self.lyrics.contains(&lrc_filename(paths::file_name(track)))
    }
}

/// Reconciles albums on a remote share
pub struct AlbumReconciler {
    pub(crate) fs: Arc<dyn RemoteFileSystem>,
    tag_reader: Arc<dyn TagReader>,
    planner: RenamePlanner,
    executor: RenameExecutor,
    writer: JournaledWriter,
    pub(crate) thresholds: CoverThresholds,
    extensions: Vec<String>,
    pub(crate) component: Component,
    dry_run: bool,
    undo_log: Mutex<UndoLog>,
}

impl AlbumReconciler {
    pub fn new(
        fs: Arc<dyn RemoteFileSystem>,
        tag_reader: Arc<dyn TagReader>,
        config: &AppConfig,
        component: Component,
    ) -> Result<Self> {
        let names = NameGenerator::new(NamingConfig::from(config))?;
        let mut planner = RenamePlanner::new(names);
        if config.relocate_artists {
            planner = planner.with_artist_relocation("");
        }

        Ok(Self {
            planner,
            executor: RenameExecutor::new(fs.clone(), config.dry_run),
            writer: JournaledWriter::new(fs.clone(), config.dry_run),
            fs,
            tag_reader,
            thresholds: CoverThresholds::from(config),
            extensions: config.audio_extensions.clone(),
            component,
            dry_run: config.dry_run,
            undo_log: Mutex::new(UndoLog::new(config.undo_log_path.clone())),
        })
    }

    /// Replace the journal, e.g. to inject a clock
    pub fn with_undo_log(mut self, undo_log: UndoLog) -> Self {
        self.undo_log = Mutex::new(undo_log);
        self
    }

    pub fn names(&self) -> &NameGenerator {
        self.planner.names()
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub(crate) async fn list_album(&self, album_path: &str) -> Result<AlbumListing> {
        let mut entries = self.fs.list_directory(album_path).await?;
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let mut listing = AlbumListing {
            has_subdirectories: entries.iter().any(|e| e.is_directory),
            ..Default::default()
        };
        for entry in entries.into_iter().filter(|e| !e.is_directory) {
            let lower = entry.name.to_lowercase();
            if paths::has_extension(&entry.name, &self.extensions) {
                listing.tracks.push(paths::join(album_path, &entry.name));
            } else if lower.ends_with(".lrc") {
                listing.lyrics.insert(entry.name);
            } else if COVER_FILE_NAMES.contains(&lower.as_str()) {
                let rank = |name: &str| {
                    COVER_FILE_NAMES
                        .iter()
                        .position(|c| *c == name.to_lowercase())
                        .unwrap_or(usize::MAX)
                };
                let better = listing
                    .cover
                    .as_deref()
                    .map(|current| rank(&entry.name) < rank(paths::file_name(current)))
                    .unwrap_or(true);
                if better {
                    listing.cover = Some(paths::join(album_path, &entry.name));
                }
            }
        }

        Ok(listing)
    }

    /// Tags of one track, `None` when unreadable
    pub(crate) async fn read_metadata(&self, path: &str) -> Option<TrackMetadata> {
        match self.fs.read_file(path).await {
            Ok(data) => self.tag_reader.read(&data, path),
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to read track");
                None
            }
        }
    }

    /// Reconcile the album at `album_path`
    ///
    /// Fails when the album cannot be listed or its first track has no
    /// readable tags. Individual rename and write failures are counted in the
    /// report instead.
    #[instrument(skip(self), fields(album = %strip_path(album_path), component = %self.component))]
    pub async fn process_album(&self, album_path: &str) -> Result<AlbumReport> {
        let mut listing = self.list_album(album_path).await?;
        let mut report = AlbumReport {
            path: album_path.to_string(),
            tracks: listing.tracks.len(),
            ..Default::default()
        };

        let Some(first) = listing.tracks.first().cloned() else {
            debug!("No tracks, nothing to do");
            return Ok(report);
        };

        let album_meta = self
            .read_metadata(&first)
            .await
            .ok_or_else(|| SyncError::AlbumSkipped {
                path: album_path.to_string(),
                reason: format!("no readable tags in {}", paths::file_name(&first)),
            })?;

        let mut track_meta = HashMap::from([(first.clone(), album_meta.clone())]);
        let mut undo_log = self.undo_log.lock().await;

        if self.component.includes(Component::Naming) {
            for track in listing.tracks.iter().skip(1) {
                if let Some(meta) = self.read_metadata(track).await {
                    track_meta.insert(track.clone(), meta);
                }
            }

            let actions = self.planner.plan(
                &report.path,
                &listing.tracks,
                &album_meta,
                Some(&track_meta),
                listing.has_subdirectories,
            );
            let executed = self.executor.execute(&actions, &mut undo_log).await;
            report.renames = executed.success_count;
            report.rename_errors = executed.error_count;

            if !self.dry_run && executed.success_count > 0 {
                // Applied renames reach the journal even if the relisting fails
                undo_log.save().await?;
                let new_path = executed.album_path_after(&report.path);
                track_meta = rekey_tracks(track_meta, &new_path, &executed);
                report.path = new_path;
                listing = self.list_album(&report.path).await?;
            }
        }

        if self.component.includes(Component::Artwork) {
            self.reconcile_artwork(&listing, &album_meta, &track_meta, &mut undo_log, &mut report)
                .await;
        }

        if self.component.includes(Component::Lyrics) {
            self.reconcile_lyrics(&listing, &track_meta, &mut undo_log, &mut report)
                .await;
        }

        if !self.dry_run {
            undo_log.save().await?;
        }

        info!(
            path = %report.path,
            renames = report.renames,
            covers = report.covers_added + report.covers_replaced,
            lyrics = report.lyrics_added,
            errors = report.errors(),
            "Album reconciled"
        );

        Ok(report)
    }

    async fn reconcile_artwork(
        &self,
        listing: &AlbumListing,
        album_meta: &TrackMetadata,
        track_meta: &HashMap<String, TrackMetadata>,
        undo_log: &mut UndoLog,
        report: &mut AlbumReport,
    ) {
        let existing = match &listing.cover {
            Some(path) => match self.fs.read_file(path).await {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to read existing cover");
                    None
                }
            },
            None => None,
        };

        let decision = should_replace_cover(existing.as_deref(), &self.thresholds);
        if !decision.should_replace() {
            debug!(?decision, "Keeping existing cover");
            return;
        }

        let candidate = album_meta.front_cover.as_ref().or_else(|| {
            listing
                .tracks
                .iter()
                .filter_map(|t| track_meta.get(t))
                .find_map(|m| m.front_cover.as_ref())
        });
        let Some(picture) = candidate else {
            debug!(?decision, "No embedded cover to use");
            return;
        };

        let candidate_analysis = analyze_cover(&picture.data, &self.thresholds);
        let existing_analysis = existing
            .as_deref()
            .map(|data| analyze_cover(data, &self.thresholds));
        if !is_improvement(&candidate_analysis, existing_analysis.as_ref()) {
            debug!("Embedded cover is not an improvement");
            return;
        }

        let path = paths::join(&report.path, COVER_FILE_NAME);
        let written = match cover_jpeg_bytes(picture) {
            Ok(bytes) => self.writer.write_file(&path, bytes, undo_log).await,
            Err(e) => Err(e.into()),
        };

        match written {
            Ok(_) if listing.cover.is_some() => {
                info!(path = %path, ?decision, "Cover replaced");
                report.covers_replaced += 1;
            }
            Ok(_) => {
                info!(path = %path, "Cover added");
                report.covers_added += 1;
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to write cover");
                report.write_errors += 1;
            }
        }
    }

    async fn reconcile_lyrics(
        &self,
        listing: &AlbumListing,
        track_meta: &HashMap<String, TrackMetadata>,
        undo_log: &mut UndoLog,
        report: &mut AlbumReport,
    ) {
        for track in &listing.tracks {
            if listing.has_lyrics_for(track) {
                continue;
            }

            let lyrics = match track_meta.get(track) {
                Some(meta) => meta.lyrics.clone(),
                None => self.read_metadata(track).await.and_then(|m| m.lyrics),
            };
            let Some(lyrics) = lyrics else {
                continue;
            };

            let path = paths::join(&report.path, &lrc_filename(paths::file_name(track)));
            match self
                .writer
                .write_file(&path, Bytes::from(lyrics), undo_log)
                .await
            {
                Ok(_) => {
                    debug!(path = %path, "Lyrics written");
                    report.lyrics_added += 1;
                }
                Err(e) => {
                    warn!(path = %path, error = %e, "Failed to write lyrics");
                    report.write_errors += 1;
                }
            }
        }
    }
}

/// Move metadata keys to the paths the tracks were renamed to
fn rekey_tracks(
    track_meta: HashMap<String, TrackMetadata>,
    album_path: &str,
    executed: &ExecutionReport,
) -> HashMap<String, TrackMetadata> {
    track_meta
        .into_iter()
        .map(|(old_path, meta)| {
            let at_album = paths::join(album_path, paths::file_name(&old_path));
            let new_path = executed
                .applied
                .iter()
                .find(|a| a.kind == ActionKind::File && a.src == at_album)
                .map(|a| a.dst.clone())
                .unwrap_or(at_album);
            (new_path, meta)
        })
        .collect()
}

#[async_trait]
impl ReconcileCallback for AlbumReconciler {
    async fn reconcile(&self, albums: &[String]) -> Result<()> {
        let mut failed = 0;

        for album in albums {
            if album.is_empty() {
                debug!("Ignoring tracks at the share root");
                continue;
            }

            if let Err(e) = self.process_album(album).await {
                warn!(album = %album, error = %e, "Album reconciliation failed");
                failed += 1;
            }
        }

        if failed > 0 {
            return Err(SyncError::Reconcile(format!(
                "{} of {} albums failed",
                failed,
                albums.len()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_parsing() {
        assert_eq!("naming".parse::<Component>().unwrap(), Component::Naming);
        assert_eq!("ALL".parse::<Component>().unwrap(), Component::All);
        assert!("covers".parse::<Component>().is_err());
    }

    #[test]
    fn test_component_includes() {
        assert!(Component::All.includes(Component::Lyrics));
        assert!(Component::Artwork.includes(Component::Artwork));
        assert!(!Component::Artwork.includes(Component::Naming));
    }

    #[test]
    fn test_rekey_tracks() {
        let executed = ExecutionReport {
            success_count: 2,
            error_count: 0,
            applied: vec![
                crate::planner::RenameAction {
                    src: "A/old".to_string(),
                    dst: "A/New".to_string(),
                    kind: ActionKind::AlbumFolder,
                    description: String::new(),
                },
                crate::planner::RenameAction {
                    src: "A/New/x.flac".to_string(),
                    dst: "A/New/01 - X.flac".to_string(),
                    kind: ActionKind::File,
                    description: String::new(),
                },
            ],
        };
        let meta = HashMap::from([
            ("A/old/x.flac".to_string(), TrackMetadata::default()),
            ("A/old/02 - Y.flac".to_string(), TrackMetadata::default()),
        ]);

        let rekeyed = rekey_tracks(meta, "A/New", &executed);
        assert!(rekeyed.contains_key("A/New/01 - X.flac"));
        assert!(rekeyed.contains_key("A/New/02 - Y.flac"));
    }
}
