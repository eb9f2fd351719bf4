//! Normalized track metadata
//!
//! Every tag-derived field is optional: `None` means the tag reader found
//! nothing, which is different from an empty title or a zero year.

use bytes::Bytes;
use std::time::Duration;

/// Album-artist values that mark a Various Artists release
const COMPILATION_ALIASES: &[&str] = &[
    "various artists",
    "various",
    "va",
    "compilation",
    "soundtrack",
    "ost",
];

/// Picture found inside the audio tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPicture {
    /// Raw image bytes as stored in the tag
    pub data: Bytes,
    /// MIME type (e.g., "image/jpeg"), when the tag declares one
    pub mime_type: Option<String>,
}

impl EmbeddedPicture {
    pub fn is_jpeg(&self) -> bool {
        matches!(self.mime_type.as_deref(), Some("image/jpeg") | Some("image/jpg"))
    }
}

/// Metadata for a single audio track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,

    pub track_number: Option<u32>,
    pub total_tracks: Option<u32>,
    pub disc_number: Option<u32>,
    pub total_discs: Option<u32>,

    pub year: Option<i32>,
    pub genre: Option<String>,
    pub duration: Option<Duration>,

    /// Container/codec name: "FLAC", "MP3", "AAC", "OGG", "Opus", "WAV", ...
    pub format: Option<String>,
    /// Audio bitrate in kbps
    pub bitrate: Option<u32>,
    /// Sample rate in Hz
    pub sample_rate: Option<u32>,
    /// Bits per sample (lossless formats)
    pub bit_depth: Option<u8>,

    /// Share path the metadata was read from; supplies the file extension
    pub file_path: String,

    /// Front cover embedded in the tags
    pub front_cover: Option<EmbeddedPicture>,
    /// Lyrics embedded in the tags (plain or LRC formatted)
    pub lyrics: Option<String>,
}

impl TrackMetadata {
    /// Whether the album artist names a Various Artists release
    pub fn is_compilation(&self) -> bool {
        self.album_artist
            .as_deref()
            .map(|aa| {
                let lower = aa.trim().to_lowercase();
                COMPILATION_ALIASES.contains(&lower.as_str())
            })
            .unwrap_or(false)
    }

    /// Format tag used in album folder names, e.g. `FLAC 24-96` or `MP3 320`
    ///
    /// | Format | Tag |
    /// |--------|-----|
    /// | FLAC | `FLAC <bits>-<kHz>` when both are known, else `FLAC` |
    /// | MP3 | `MP3 <kbps>` or `MP3` |
    /// | AAC, M4A | `AAC <kbps>` or `AAC` |
    /// | OGG, Opus | `<format> <kbps>` or the bare format |
    /// | other | the format name |
    /// | unknown | `Unknown` |
    pub fn format_tag(&self) -> String {
        let Some(format) = self.format.as_deref().filter(|f| !f.is_empty()) else {
            return "Unknown".to_string();
        };

        match format {
            "FLAC" => match (self.bit_depth, self.sample_rate) {
                (Some(bits), Some(rate)) if bits > 0 && rate > 0 => {
                    format!("FLAC {}-{}", bits, rate / 1000)
                }
                _ => "FLAC".to_string(),
            },
            "MP3" => with_bitrate("MP3", self.bitrate),
            "AAC" | "M4A" => with_bitrate("AAC", self.bitrate),
            "OGG" | "Opus" => with_bitrate(format, self.bitrate),
            other => other.to_string(),
        }
    }

    /// Best available artist: album artist, then track artist
    pub fn display_artist(&self) -> Option<&str> {
        non_blank(&self.album_artist).or_else(|| non_blank(&self.artist))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn with_bitrate(name: &str, bitrate: Option<u32>) -> String {
    match bitrate {
        Some(kbps) if kbps > 0 => format!("{} {}", name, kbps),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(format: &str) -> TrackMetadata {
        TrackMetadata {
            format: Some(format.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_compilation_aliases() {
        for alias in ["Various Artists", "VA", "soundtrack", " OST "] {
            let m = TrackMetadata {
                album_artist: Some(alias.to_string()),
                ..Default::default()
            };
            assert!(m.is_compilation(), "{alias} should be a compilation");
        }

        let band = TrackMetadata {
            album_artist: Some("Various Cruelties".to_string()),
            ..Default::default()
        };
        assert!(!band.is_compilation());
        assert!(!TrackMetadata::default().is_compilation());
    }

    #[test]
    fn test_format_tag_flac() {
        let mut m = meta("FLAC");
        assert_eq!(m.format_tag(), "FLAC");

        m.bit_depth = Some(24);
        assert_eq!(m.format_tag(), "FLAC");

        m.sample_rate = Some(96_000);
        assert_eq!(m.format_tag(), "FLAC 24-96");

        m.bit_depth = Some(16);
        m.sample_rate = Some(44_100);
        assert_eq!(m.format_tag(), "FLAC 16-44");
    }

    #[test]
    fn test_format_tag_lossy() {
        let mut mp3 = meta("MP3");
        assert_eq!(mp3.format_tag(), "MP3");
        mp3.bitrate = Some(320);
        assert_eq!(mp3.format_tag(), "MP3 320");

        let mut m4a = meta("M4A");
        assert_eq!(m4a.format_tag(), "AAC");
        m4a.bitrate = Some(256);
        assert_eq!(m4a.format_tag(), "AAC 256");

        let mut opus = meta("Opus");
        assert_eq!(opus.format_tag(), "Opus");
        opus.bitrate = Some(160);
        assert_eq!(opus.format_tag(), "Opus 160");
    }

    #[test]
    fn test_format_tag_other_and_unknown() {
        assert_eq!(meta("WAV").format_tag(), "WAV");
        assert_eq!(meta("").format_tag(), "Unknown");
        assert_eq!(TrackMetadata::default().format_tag(), "Unknown");
    }

    #[test]
    fn test_display_artist_fallback() {
        let mut m = TrackMetadata {
            artist: Some("Roger Waters".to_string()),
            ..Default::default()
        };
        assert_eq!(m.display_artist(), Some("Roger Waters"));

        m.album_artist = Some("Pink Floyd".to_string());
        assert_eq!(m.display_artist(), Some("Pink Floyd"));
    }
}
