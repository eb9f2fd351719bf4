//! Album Cover Quality Checks
//!
//! Decides whether an album's `cover.jpg` should be written or replaced,
//! based on the image's shorter edge and its byte size.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::artwork::{CoverDecision, CoverThresholds, should_replace_cover};
//!
//! let thresholds = CoverThresholds::default();
//! match should_replace_cover(existing.as_deref(), &thresholds) {
//!     CoverDecision::Missing => println!("no cover"),
//!     CoverDecision::Replace(reason) => println!("replace: {reason}"),
//!     CoverDecision::Keep(_) => {}
//! }
//! ```

use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

use core_runtime::config::{AppConfig, DEFAULT_COVER_MIN_DIMENSION, DEFAULT_COVER_MIN_SIZE};

use crate::error::{MetadataError, Result};
use crate::metadata::EmbeddedPicture;

/// File names recognised as an existing album cover
pub const COVER_FILE_NAMES: &[&str] = &["cover.jpg", "cover.png", "folder.jpg"];

/// Name covers are written under
pub const COVER_FILE_NAME: &str = "cover.jpg";

/// Minimum acceptable cover quality
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverThresholds {
    /// Shorter edge in pixels
    pub min_dimension: u32,
    /// Encoded size in bytes
    pub min_size: u64,
}

impl Default for CoverThresholds {
    fn default() -> Self {
        Self {
            min_dimension: DEFAULT_COVER_MIN_DIMENSION,
            min_size: DEFAULT_COVER_MIN_SIZE,
        }
    }
}

impl From<&AppConfig> for CoverThresholds {
    fn from(config: &AppConfig) -> Self {
        Self {
            min_dimension: config.cover_min_dimension,
            min_size: config.cover_min_size,
        }
    }
}

/// Quality assessment of one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverAnalysis {
    /// 0 when the image cannot be decoded
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
    pub needs_replacement: bool,
    /// Why replacement is needed, empty otherwise
    pub reason: String,
}

impl CoverAnalysis {
    pub fn min_dimension(&self) -> u32 {
        self.width.min(self.height)
    }

    pub fn is_decodable(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Outcome of checking an album's existing cover
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverDecision {
    /// No cover file at all
    Missing,
    /// Cover exists but is below the thresholds
    Replace(String),
    /// Cover is good enough
    Keep(String),
}

impl CoverDecision {
    pub fn should_replace(&self) -> bool {
        !matches!(self, CoverDecision::Keep(_))
    }
}

/// Measure an encoded image against the thresholds
///
/// Undecodable data is reported as needing replacement.
pub fn analyze_cover(data: &[u8], thresholds: &CoverThresholds) -> CoverAnalysis {
    let size_bytes = data.len() as u64;

    let img = match image::load_from_memory(data) {
        Ok(img) => img,
        Err(e) => {
            return CoverAnalysis {
                width: 0,
                height: 0,
                size_bytes,
                needs_replacement: true,
                reason: format!("Cannot decode image: {}", e),
            }
        }
    };

    let (width, height) = (img.width(), img.height());
    let min_dim = width.min(height);

    let reason = if min_dim < thresholds.min_dimension {
        format!(
            "Too small: {}x{} (min {}px)",
            width, height, thresholds.min_dimension
        )
    } else if size_bytes < thresholds.min_size {
        format!(
            "Low quality: {}KB (min {}KB)",
            size_bytes / 1024,
            thresholds.min_size / 1024
        )
    } else {
        String::new()
    };

    CoverAnalysis {
        width,
        height,
        size_bytes,
        needs_replacement: !reason.is_empty(),
        reason,
    }
}

/// Decide what to do with an album's existing cover
pub fn should_replace_cover(existing: Option<&[u8]>, thresholds: &CoverThresholds) -> CoverDecision {
    let Some(data) = existing else {
        return CoverDecision::Missing;
    };

    let analysis = analyze_cover(data, thresholds);
    if analysis.needs_replacement {
        CoverDecision::Replace(analysis.reason)
    } else {
        CoverDecision::Keep(format!(
            "Cover is good: {}x{}, {}KB",
            analysis.width,
            analysis.height,
            analysis.size_bytes / 1024
        ))
    }
}

/// Whether `candidate` would be a better cover than `existing`
///
/// Anything decodable beats no cover. Otherwise the larger shorter edge wins,
/// with byte size breaking ties.
pub fn is_improvement(candidate: &CoverAnalysis, existing: Option<&CoverAnalysis>) -> bool {
    if !candidate.is_decodable() {
        return false;
    }

    match existing {
        None => true,
        Some(current) if !current.is_decodable() => true,
        Some(current) => {
            let (new_dim, old_dim) = (candidate.min_dimension(), current.min_dimension());
            new_dim > old_dim || (new_dim == old_dim && candidate.size_bytes > current.size_bytes)
        }
    }
}

/// Encoded bytes suitable for `cover.jpg`
///
/// JPEG pictures are returned as is; anything else is decoded and
/// re-encoded as JPEG.
pub fn cover_jpeg_bytes(picture: &EmbeddedPicture) -> Result<Bytes> {
    if picture.is_jpeg() {
        return Ok(picture.data.clone());
    }

    let img = image::load_from_memory(&picture.data)
        .map_err(|e| MetadataError::ImageProcessing(format!("Failed to load image: {}", e)))?;

    // The JPEG encoder has no alpha channel
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buffer = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .map_err(|e| MetadataError::ImageProcessing(format!("Failed to encode JPEG: {}", e)))?;

    Ok(Bytes::from(buffer))
}
