//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop and server hosts
//! (Linux, macOS, Windows).
//!
//! ## Overview
//!
//! - `RemoteFileSystem` using `tokio::fs` over a mounted share
//!   ([`MountedShareFileSystem`])
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::MountedShareFileSystem;
//! use bridge_traits::RemoteFileSystem;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let fs: Arc<dyn RemoteFileSystem> = Arc::new(MountedShareFileSystem::new("/mnt/music"));
//!     let top_level = fs.list_directory("").await.unwrap();
//!     println!("{} entries", top_level.len());
//! }
//! ```

mod filesystem;

pub use filesystem::MountedShareFileSystem;
