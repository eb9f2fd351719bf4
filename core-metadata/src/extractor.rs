//! Audio Tag Extraction
//!
//! Reads [`TrackMetadata`] from raw audio bytes using the `lofty` crate. It
//! supports ID3v2, Vorbis Comments, MP4 atoms, RIFF INFO and APE tags.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::extractor::{LoftyTagReader, TagReader};
//!
//! let reader = LoftyTagReader::new();
//! let bytes = std::fs::read("01 - Song.flac")?;
//! if let Some(meta) = reader.read(&bytes, "Artist/Album/01 - Song.flac") {
//!     println!("Title: {}", meta.title.unwrap_or_default());
//! }
//! ```

use bytes::Bytes;
use lofty::config::ParseOptions;
use lofty::file::{AudioFile, FileType, TaggedFileExt};
use lofty::picture::{MimeType, PictureType};
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use std::io::Cursor;
use tracing::debug;

use crate::error::{MetadataError, Result};
use crate::metadata::{EmbeddedPicture, TrackMetadata};

/// Metadata extraction collaborator
///
/// Implementations never fail on malformed input: anything that cannot be
/// parsed yields `None`.
pub trait TagReader: Send + Sync {
    /// Parse tags from the full file contents
    ///
    /// `path_hint` is the share path of the file; it is stored in
    /// [`TrackMetadata::file_path`] and supplies the extension.
    fn read(&self, data: &[u8], path_hint: &str) -> Option<TrackMetadata>;
}

/// Tag reader backed by `lofty`
pub struct LoftyTagReader {
    /// Parse options for lofty
    parse_options: ParseOptions,
}

impl LoftyTagReader {
    /// Create a new tag reader with default settings
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }

    /// Create a reader with custom parse options
    pub fn with_options(parse_options: ParseOptions) -> Self {
        Self { parse_options }
    }

    /// Extract metadata, reporting why parsing failed
    pub fn extract(&self, data: &[u8], path_hint: &str) -> Result<TrackMetadata> {
        let tagged_file = Probe::new(Cursor::new(data))
            .options(self.parse_options)
            .guess_file_type()
            .map_err(|e| MetadataError::ExtractionFailed(format!("Failed to probe file: {}", e)))?
            .read()
            .map_err(|e| MetadataError::ExtractionFailed(format!("Failed to parse file: {}", e)))?;

        let properties = tagged_file.properties();
        let duration = properties.duration();

        let mut meta = TrackMetadata {
            format: Some(Self::format_name(tagged_file.file_type())),
            bitrate: properties.audio_bitrate().filter(|b| *b > 0),
            sample_rate: properties.sample_rate().filter(|r| *r > 0),
            bit_depth: properties.bit_depth().filter(|b| *b > 0),
            duration: (!duration.is_zero()).then_some(duration),
            file_path: path_hint.to_string(),
            ..Default::default()
        };

        // Primary tag first, falling back to any tag the file carries
        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag());

        match tag {
            Some(tag) => Self::apply_tag(&mut meta, tag),
            None => debug!(path = %path_hint, "No tags found"),
        }

        // Tracks without an album artist are filed under their artist
        if meta.album_artist.is_none() {
            meta.album_artist = meta.artist.clone();
        }

        Ok(meta)
    }

    fn apply_tag(meta: &mut TrackMetadata, tag: &Tag) {
        meta.title = tag.title().and_then(|s| Self::normalize_text(s.as_ref()));
        meta.artist = tag.artist().and_then(|s| Self::normalize_text(s.as_ref()));
        meta.album = tag.album().and_then(|s| Self::normalize_text(s.as_ref()));
        meta.album_artist = tag
            .get_string(&ItemKey::AlbumArtist)
            .and_then(Self::normalize_text);
        meta.genre = tag.genre().and_then(|s| Self::normalize_text(s.as_ref()));
        meta.year = tag.year().map(|y| y as i32).filter(|y| *y > 0);
        meta.track_number = tag.track().filter(|n| *n > 0);
        meta.total_tracks = tag.track_total().filter(|n| *n > 0);
        meta.disc_number = tag.disk().filter(|n| *n > 0);
        meta.total_discs = tag.disk_total().filter(|n| *n > 0);
        meta.lyrics = tag
            .get_string(&ItemKey::Lyrics)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        meta.front_cover = Self::front_cover(tag);
    }

    /// Front cover, or the only picture when none is typed as such
    fn front_cover(tag: &Tag) -> Option<EmbeddedPicture> {
        let pictures = tag.pictures();
        let picture = pictures
            .iter()
            .find(|p| p.pic_type() == PictureType::CoverFront)
            .or_else(|| (pictures.len() == 1).then(|| &pictures[0]))?;

        if picture.data().is_empty() {
            return None;
        }

        Some(EmbeddedPicture {
            data: Bytes::copy_from_slice(picture.data()),
            mime_type: picture.mime_type().and_then(Self::mime_type_to_string),
        })
    }

    /// Normalize text metadata
    ///
    /// - Trims leading/trailing whitespace
    /// - Normalizes consecutive whitespace to single space
    /// - Removes control characters
    /// - Maps empty results to `None`
    fn normalize_text(text: &str) -> Option<String> {
        let normalized: String = text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .chars()
            .filter(|c| !c.is_control())
            .collect();

        (!normalized.is_empty()).then_some(normalized)
    }

    fn mime_type_to_string(mime_type: &MimeType) -> Option<String> {
        match mime_type {
            MimeType::Png => Some("image/png".to_string()),
            MimeType::Jpeg => Some("image/jpeg".to_string()),
            MimeType::Tiff => Some("image/tiff".to_string()),
            MimeType::Bmp => Some("image/bmp".to_string()),
            MimeType::Gif => Some("image/gif".to_string()),
            _ => None,
        }
    }

    /// Format names used by the folder format tag
    fn format_name(file_type: FileType) -> String {
        match file_type {
            FileType::Flac => "FLAC",
            FileType::Mpeg => "MP3",
            FileType::Mp4 | FileType::Aac => "AAC",
            FileType::Vorbis => "OGG",
            FileType::Opus => "Opus",
            FileType::Wav => "WAV",
            FileType::Aiff => "AIFF",
            FileType::Ape => "APE",
            FileType::WavPack => "WavPack",
            FileType::Mpc => "MPC",
            FileType::Speex => "Speex",
            other => return format!("{:?}", other),
        }
        .to_string()
    }
}

impl Default for LoftyTagReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TagReader for LoftyTagReader {
    fn read(&self, data: &[u8], path_hint: &str) -> Option<TrackMetadata> {
        match self.extract(data, path_hint) {
            Ok(meta) => Some(meta),
            Err(e) => {
                debug!(path = %path_hint, error = %e, "Unparseable audio file");
                None
            }
        }
    }
}
