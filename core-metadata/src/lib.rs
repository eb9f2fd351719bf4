//! # Metadata & Naming Module
//!
//! Turns audio tags into canonical library names.
//!
//! ## Overview
//!
//! This module handles:
//! - Audio tag extraction (ID3, Vorbis, MP4, FLAC, RIFF)
//! - Canonical folder and file name derivation
//! - Scene-release name cleanup and naming issue detection
//! - Album cover quality checks for embedded artwork

pub mod artwork;
pub mod error;
pub mod extractor;
pub mod metadata;
pub mod naming;
pub mod scene;

pub use artwork::{CoverDecision, CoverThresholds};
pub use error::{MetadataError, Result};
pub use extractor::{LoftyTagReader, TagReader};
pub use metadata::{EmbeddedPicture, TrackMetadata};
pub use naming::{
    detect_naming_issues, lrc_filename, sanitize_name, NameGenerator, NamingConfig, NamingResult,
};
pub use scene::clean_scene_name;
