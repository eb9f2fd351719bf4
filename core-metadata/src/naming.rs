//! Canonical Folder and File Naming
//!
//! Maps track metadata onto the canonical library layout:
//!
//! ```text
//! <Album Artist>/<Album> (<Year>) [<Format>]/<Track> - <Title>.<ext>
//! Compilations/<Album> (<Year>) [<Format>]/<Disc>-<Track> - <Title>.<ext>
//! ```
//!
//! All functions here are pure. A [`NameGenerator`] is built once from an
//! immutable [`NamingConfig`] and can be shared freely.

use once_cell::sync::Lazy;
use regex::Regex;

use core_runtime::config::{AppConfig, DEFAULT_COMPILATIONS_FOLDER};

use crate::error::{MetadataError, Result};
use crate::metadata::TrackMetadata;

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const UNKNOWN_ALBUM: &str = "Unknown Album";
const UNKNOWN_TRACK: &str = "Unknown Track";
const DEFAULT_EXTENSION: &str = ".flac";

/// Characters rejected by at least one common filesystem
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

static SCENE_RELEASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.[A-Za-z0-9]+\.[A-Z0-9]{2,10}-[A-Z0-9]+\.").unwrap());
static DOTS_AS_SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.[A-Za-z].*\.[A-Za-z]").unwrap());
static TRACK_NUMBER_LATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z].*\s\d{1,2}[-_.]").unwrap());
static LEADING_TRACK_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,2}").unwrap());
static GROUP_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)-[A-Z0-9]{2,10}\.[a-z]+$").unwrap());

/// Static naming settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingConfig {
    /// Artist folder for compilations
    pub compilations_folder: String,
    /// Substitute for characters that cannot appear in names
    pub replacement: char,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            compilations_folder: DEFAULT_COMPILATIONS_FOLDER.to_string(),
            replacement: '_',
        }
    }
}

impl From<&AppConfig> for NamingConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            compilations_folder: config.compilations_folder.clone(),
            ..Self::default()
        }
    }
}

/// Result of comparing a track's current location with its canonical one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingResult {
    /// Canonical `"<artist>/<album>"`
    pub folder_path: String,
    /// Canonical file name
    pub file_name: String,
    /// `folder_path` joined with `file_name`
    pub full_path: String,
    /// One line per differing segment; empty when already canonical
    pub changes: Vec<String>,
}

impl NamingResult {
    pub fn is_canonical(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Derives canonical names from metadata
#[derive(Debug, Clone, Default)]
pub struct NameGenerator {
    config: NamingConfig,
}

impl NameGenerator {
    /// Create a generator
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::InvalidConfig`] when the replacement is itself
    /// an invalid character or the compilations folder does not survive
    /// sanitization unchanged.
    pub fn new(config: NamingConfig) -> Result<Self> {
        if INVALID_CHARS.contains(&config.replacement) || config.replacement.is_control() {
            return Err(MetadataError::InvalidConfig(format!(
                "replacement character {:?} is not allowed in names",
                config.replacement
            )));
        }

        let sanitized = sanitize_name(&config.compilations_folder, config.replacement);
        if sanitized.is_empty() || sanitized != config.compilations_folder {
            return Err(MetadataError::InvalidConfig(format!(
                "compilations folder '{}' is not a valid folder name",
                config.compilations_folder
            )));
        }

        Ok(Self { config })
    }

    pub fn config(&self) -> &NamingConfig {
        &self.config
    }

    /// Sanitize a single path segment with the configured replacement
    pub fn sanitize(&self, name: &str) -> String {
        sanitize_name(name, self.config.replacement)
    }

    /// Canonical artist folder
    pub fn artist_folder(&self, meta: &TrackMetadata) -> String {
        if meta.is_compilation() {
            return self.config.compilations_folder.clone();
        }

        self.segment(meta.display_artist(), UNKNOWN_ARTIST)
    }

    /// Canonical album folder: `Album (Year) [Format]`
    pub fn album_folder(&self, meta: &TrackMetadata) -> String {
        let mut album = self.segment(meta.album.as_deref(), UNKNOWN_ALBUM);

        if let Some(year) = meta.year {
            album.push_str(&format!(" ({})", year));
        }

        album.push_str(&format!(" [{}]", meta.format_tag()));
        album
    }

    /// Canonical `"<artist>/<album>"` folder path
    pub fn folder_name(&self, meta: &TrackMetadata) -> String {
        format!("{}/{}", self.artist_folder(meta), self.album_folder(meta))
    }

    /// Canonical track file name
    ///
    /// `DD - Title.ext` for single-disc releases, `D-DD - Title.ext` when the
    /// release has more than one disc or the track is not on disc 1.
    pub fn track_filename(&self, meta: &TrackMetadata) -> String {
        let extension = file_extension(&meta.file_path)
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

        let title = self.segment(meta.title.as_deref(), UNKNOWN_TRACK);
        let track = meta.track_number.unwrap_or(1);

        let multi_disc =
            meta.total_discs.unwrap_or(1) > 1 || meta.disc_number.unwrap_or(1) > 1;

        if multi_disc {
            let disc = meta.disc_number.unwrap_or(1);
            format!("{}-{:02} - {}{}", disc, track, title, extension)
        } else {
            format!("{:02} - {}{}", track, title, extension)
        }
    }

    /// Compare a track's current path with its canonical location
    ///
    /// `current_path` is the share path of the file; its parent is taken as
    /// the album folder and its grandparent as the artist folder.
    pub fn analyze_current_name(&self, current_path: &str, meta: &TrackMetadata) -> NamingResult {
        let artist = self.artist_folder(meta);
        let album = self.album_folder(meta);
        let file_name = self.track_filename(meta);
        let folder_path = format!("{}/{}", artist, album);
        let full_path = format!("{}/{}", folder_path, file_name);

        let normalized = current_path.replace('\\', "/");
        let mut segments = normalized.rsplit('/');
        let current_file = segments.next().unwrap_or_default();
        let current_album = segments.next().unwrap_or_default();
        let current_artist = segments.next().unwrap_or_default();

        let mut changes = Vec::new();
        if current_file != file_name {
            changes.push(format!("Rename file: '{}' -> '{}'", current_file, file_name));
        }
        if current_artist != artist {
            changes.push(format!("Move to artist: '{}' -> '{}'", current_artist, artist));
        }
        if current_album != album {
            changes.push(format!(
                "Rename album folder: '{}' -> '{}'",
                current_album, album
            ));
        }

        NamingResult {
            folder_path,
            file_name,
            full_path,
            changes,
        }
    }

    fn segment(&self, value: Option<&str>, fallback: &str) -> String {
        value
            .map(|v| self.sanitize(v))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Replace characters that are invalid in file names and tidy whitespace
///
/// - `<>:"/\|?*` and control characters become `replacement`
/// - whitespace runs collapse to one space
/// - runs of `replacement` collapse to one
/// - leading/trailing spaces and dots are removed
///
/// Applying it twice gives the same result as applying it once.
pub fn sanitize_name(name: &str, replacement: char) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev: Option<char> = None;

    for c in name.chars() {
        let c = if INVALID_CHARS.contains(&c) || (c as u32) < 0x20 {
            replacement
        } else if c.is_whitespace() {
            ' '
        } else {
            c
        };

        let collapsible = c == ' ' || c == replacement;
        if collapsible && prev == Some(c) {
            continue;
        }
        out.push(c);
        prev = Some(c);
    }

    out.trim_matches(|c| c == ' ' || c == '.').to_string()
}

/// `.lrc` sidecar name for a track file name
pub fn lrc_filename(track_filename: &str) -> String {
    let stem = match track_filename.rfind('.') {
        Some(dot) if dot > 0 => &track_filename[..dot],
        _ => track_filename,
    };
    format!("{}.lrc", stem)
}

/// Filename-only heuristics for names that look hand-made or scene-sourced
pub fn detect_naming_issues(filename: &str) -> Vec<String> {
    let mut issues = Vec::new();

    if SCENE_RELEASE.is_match(filename) {
        issues.push("Scene release naming detected".to_string());
    }

    if DOTS_AS_SPACES.is_match(filename) {
        issues.push("Uses dots instead of spaces".to_string());
    }

    if TRACK_NUMBER_LATE.is_match(filename) {
        issues.push("Track number not at start".to_string());
    }

    // "01 - Title.flac" is the canonical shape; "Artist - Title.flac" is not
    if filename.contains(" - ") && !LEADING_TRACK_NUMBER.is_match(filename) {
        issues.push("May contain artist name (should be in folder)".to_string());
    }

    if GROUP_TAG.is_match(filename) {
        issues.push("Contains release group tag".to_string());
    }

    issues
}

/// Extension of the last path segment, without the dot
fn file_extension(path: &str) -> Option<&str> {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < name.len() => Some(&name[dot + 1..]),
        _ => None,
    }
}
