//! # Core Configuration Module
//!
//! Provides configuration management for the media manager.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct an
//! [`AppConfig`] instance that holds every setting the engine needs. It
//! enforces fail-fast validation so that a bad share root or an empty
//! extension list is reported before any remote I/O happens.
//!
//! Once built, an `AppConfig` is immutable. Components receive it (or the
//! parts they care about) by reference.
//!
//! ## Usage
//!
//! ### Programmatic configuration
//!
//! ```ignore
//! use core_runtime::config::AppConfig;
//! use std::time::Duration;
//!
//! let config = AppConfig::builder()
//!     .share_root("/mnt/music")
//!     .poll_interval(Duration::from_secs(60))
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ### Environment configuration
//!
//! Every setting can be supplied through an `MM_`-prefixed variable:
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `MM_SHARE_ROOT` | mount point of the media share |
//! | `MM_COMPILATIONS_FOLDER` | artist folder for compilations |
//! | `MM_AUDIO_EXTENSIONS` | comma-separated tracked extensions |
//! | `MM_COVER_MIN_DIMENSION` | minimum cover edge in pixels |
//! | `MM_COVER_MIN_SIZE` | minimum cover size in bytes |
//! | `MM_UNDO_LOG_PATH` | undo journal location |
//! | `MM_WATCH_STATE_PATH` | watch snapshot location |
//! | `MM_POLL_INTERVAL` | seconds between watch cycles |
//! | `MM_DRY_RUN` | `true`/`false` |
//! | `MM_RELOCATE_ARTISTS` | move misfiled albums under their artist, `true`/`false` |
//!
//! ```ignore
//! use core_runtime::config::AppConfigBuilder;
//!
//! let config = AppConfigBuilder::from_env()?
//!     .dry_run(true) // command-line flags win over the environment
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Artist folder used for Various Artists releases
pub const DEFAULT_COMPILATIONS_FOLDER: &str = "Compilations";

/// Audio extensions tracked by default
pub const DEFAULT_AUDIO_EXTENSIONS: &[&str] =
    &[".mp3", ".flac", ".m4a", ".ogg", ".opus", ".wav", ".aiff"];

/// Covers with a shorter edge than this are considered low quality
pub const DEFAULT_COVER_MIN_DIMENSION: u32 = 800;

/// Covers smaller than this many bytes are considered low quality
pub const DEFAULT_COVER_MIN_SIZE: u64 = 500 * 1024;

pub const DEFAULT_UNDO_LOG_PATH: &str = "undo_log.jsonl";
pub const DEFAULT_WATCH_STATE_PATH: &str = ".watch_state.json";

/// Five minutes between watch cycles
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

const ENV_PREFIX: &str = "MM_";

/// Application configuration.
///
/// Use [`AppConfigBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Mount point (or other root) of the media share
    pub share_root: PathBuf,

    /// Artist folder name for compilations
    pub compilations_folder: String,

    /// Lower-cased extensions, each with a leading dot
    pub audio_extensions: Vec<String>,

    /// Minimum shorter edge of an acceptable cover, in pixels
    pub cover_min_dimension: u32,

    /// Minimum size of an acceptable cover, in bytes
    pub cover_min_size: u64,

    /// Append-only undo journal (JSON Lines)
    pub undo_log_path: PathBuf,

    /// Persisted watch snapshot
    pub watch_state_path: PathBuf,

    /// Delay between two watch cycles
    pub poll_interval: Duration,

    /// Log every mutation instead of performing it
    pub dry_run: bool,

    /// Move albums filed under the wrong artist folder to
    /// `<Artist>/<Album>`; off means album folders are only renamed in place
    pub relocate_artists: bool,
}

impl AppConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Loads configuration from `MM_*` environment variables.
    ///
    /// Equivalent to `AppConfigBuilder::from_env()?.build()`.
    pub fn from_env() -> Result<Self> {
        AppConfigBuilder::from_env()?.build()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Share root and state file paths are not empty
    /// - Compilations folder is a single, non-empty path segment
    /// - At least one audio extension is tracked and each starts with a dot
    /// - Cover thresholds and poll interval are non-zero
    pub fn validate(&self) -> Result<()> {
        if self.share_root.as_os_str().is_empty() {
            return Err(Error::Config(
                "Share root is required. Set MM_SHARE_ROOT or pass it to the builder."
                    .to_string(),
            ));
        }

        if self.compilations_folder.trim().is_empty() {
            return Err(Error::Config(
                "Compilations folder cannot be empty".to_string(),
            ));
        }

        if self.compilations_folder.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "Compilations folder must be a single folder name, got '{}'",
                self.compilations_folder
            )));
        }

        if self.audio_extensions.is_empty() {
            return Err(Error::Config(
                "At least one audio extension must be tracked".to_string(),
            ));
        }

        if let Some(bad) = self
            .audio_extensions
            .iter()
            .find(|ext| !ext.starts_with('.') || ext.len() < 2)
        {
            return Err(Error::Config(format!(
                "Audio extension '{}' must start with a dot",
                bad
            )));
        }

        if self.cover_min_dimension == 0 {
            return Err(Error::Config(
                "Cover minimum dimension must be greater than 0".to_string(),
            ));
        }

        if self.undo_log_path.as_os_str().is_empty() {
            return Err(Error::Config("Undo log path cannot be empty".to_string()));
        }

        if self.watch_state_path.as_os_str().is_empty() {
            return Err(Error::Config(
                "Watch state path cannot be empty".to_string(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(Error::Config(
                "Poll interval must be at least one second".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`AppConfig`].
///
/// Unset values fall back to the documented defaults, except the share
/// root, which has none.
#[derive(Debug, Default, Clone)]
pub struct AppConfigBuilder {
    share_root: Option<PathBuf>,
    compilations_folder: Option<String>,
    audio_extensions: Option<Vec<String>>,
    cover_min_dimension: Option<u32>,
    cover_min_size: Option<u64>,
    undo_log_path: Option<PathBuf>,
    watch_state_path: Option<PathBuf>,
    poll_interval: Option<Duration>,
    dry_run: Option<bool>,
    relocate_artists: Option<bool>,
}

impl AppConfigBuilder {
    /// Creates a builder pre-populated from `MM_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEnv`] when a numeric or boolean variable
    /// cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a builder from an arbitrary variable lookup.
    ///
    /// `lookup` receives full variable names (`MM_SHARE_ROOT`, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{}{}", ENV_PREFIX, name))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut builder = Self::default();

        if let Some(root) = get("SHARE_ROOT") {
            builder = builder.share_root(root);
        }
        if let Some(folder) = get("COMPILATIONS_FOLDER") {
            builder = builder.compilations_folder(folder);
        }
        if let Some(list) = get("AUDIO_EXTENSIONS") {
            builder = builder.audio_extensions(
                list.split(',')
                    .map(str::trim)
                    .filter(|ext| !ext.is_empty()),
            );
        }
        if let Some(value) = get("COVER_MIN_DIMENSION") {
            builder = builder.cover_min_dimension(parse_env("COVER_MIN_DIMENSION", &value)?);
        }
        if let Some(value) = get("COVER_MIN_SIZE") {
            builder = builder.cover_min_size(parse_env("COVER_MIN_SIZE", &value)?);
        }
        if let Some(path) = get("UNDO_LOG_PATH") {
            builder = builder.undo_log_path(path);
        }
        if let Some(path) = get("WATCH_STATE_PATH") {
            builder = builder.watch_state_path(path);
        }
        if let Some(value) = get("POLL_INTERVAL") {
            let secs: u64 = parse_env("POLL_INTERVAL", &value)?;
            builder = builder.poll_interval(Duration::from_secs(secs));
        }
        if let Some(value) = get("DRY_RUN") {
            builder = builder.dry_run(parse_bool("DRY_RUN", &value)?);
        }
        if let Some(value) = get("RELOCATE_ARTISTS") {
            builder = builder.relocate_artists(parse_bool("RELOCATE_ARTISTS", &value)?);
        }

        Ok(builder)
    }

    /// Sets the mount point of the media share.
    pub fn share_root<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.share_root = Some(path.into());
        self
    }

    /// Sets the artist folder used for compilations.
    ///
    /// Default: `Compilations`
    pub fn compilations_folder(mut self, folder: impl Into<String>) -> Self {
        self.compilations_folder = Some(folder.into());
        self
    }

    /// Sets the tracked audio extensions.
    ///
    /// Extensions are lower-cased and given a leading dot if missing.
    pub fn audio_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.audio_extensions = Some(
            extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
        );
        self
    }

    /// Default: 800 px
    pub fn cover_min_dimension(mut self, pixels: u32) -> Self {
        self.cover_min_dimension = Some(pixels);
        self
    }

    /// Default: 500 KiB
    pub fn cover_min_size(mut self, bytes: u64) -> Self {
        self.cover_min_size = Some(bytes);
        self
    }

    pub fn undo_log_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.undo_log_path = Some(path.into());
        self
    }

    pub fn watch_state_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.watch_state_path = Some(path.into());
        self
    }

    /// Sets the delay between watch cycles.
    ///
    /// Default: 300 seconds
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = Some(dry_run);
        self
    }

    /// Default: off
    pub fn relocate_artists(mut self, relocate: bool) -> Self {
        self.relocate_artists = Some(relocate);
        self
    }

    /// Builds the final `AppConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if validation fails.
    pub fn build(self) -> Result<AppConfig> {
        let config = AppConfig {
            share_root: self.share_root.unwrap_or_default(),
            compilations_folder: self
                .compilations_folder
                .unwrap_or_else(|| DEFAULT_COMPILATIONS_FOLDER.to_string()),
            audio_extensions: self.audio_extensions.unwrap_or_else(|| {
                DEFAULT_AUDIO_EXTENSIONS
                    .iter()
                    .map(|ext| ext.to_string())
                    .collect()
            }),
            cover_min_dimension: self
                .cover_min_dimension
                .unwrap_or(DEFAULT_COVER_MIN_DIMENSION),
            cover_min_size: self.cover_min_size.unwrap_or(DEFAULT_COVER_MIN_SIZE),
            undo_log_path: self
                .undo_log_path
                .unwrap_or_else(|| Path::new(DEFAULT_UNDO_LOG_PATH).to_path_buf()),
            watch_state_path: self
                .watch_state_path
                .unwrap_or_else(|| Path::new(DEFAULT_WATCH_STATE_PATH).to_path_buf()),
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            dry_run: self.dry_run.unwrap_or(false),
            relocate_artists: self.relocate_artists.unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

fn parse_env<T>(name: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| Error::InvalidEnv {
        key: format!("{}{}", ENV_PREFIX, name),
        message: e.to_string(),
    })
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::InvalidEnv {
            key: format!("{}{}", ENV_PREFIX, name),
            message: format!("expected a boolean, got '{}'", other),
        }),
    }
}
