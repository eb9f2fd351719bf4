//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the media manager core:
//! - Logging and tracing infrastructure
//! - Configuration management
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! Configuration is built once at startup, validated, and then passed by
//! reference to every component; nothing reads global settings.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, AppConfigBuilder};
pub use error::{Error, Result};
