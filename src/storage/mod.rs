//! # Storage Layer
//!
//! Everything in plugshelf that touches the disk.
//!
//! ## Layout
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Config | TOML | `.plugshelf/config.toml` |
//! | Bundles | Directories | `PlugIns/{name}.plugshelf/` |
//! | Manifests | JSON or TOML | `{bundle}/plugin.json`, `{bundle}/plugin.toml` |
//!
//! ## Library Structure
//!
//! ```text
//! library/
//! ├── .plugshelf/
//! │   └── config.toml          # Library configuration
//! └── PlugIns/
//!     ├── Print.plugshelf/     # A bundle
//!     │   ├── plugin.json      # Its manifest
//!     │   └── print.sh
//!     └── .duplicate.lock      # Held while a duplicate is staged
//! ```
//!
//! ## Key Types
//!
//! - [`Library`] - Entry point for a managed plugins directory
//! - [`BundleLoader`] - Reads manifests into plugins
//! - [`DuplicatePluginController`] - Copies plugins into new, independent ones
//! - [`Config`] - Library and global configuration

mod config;
mod duplicate;
mod library;
mod manifest;

pub use config::{Config, ConfigError, GlobalConfig, LibraryConfig, OutputFormat, WatchConfig, LIBRARY_DIR};
pub use duplicate::{DuplicateError, DuplicatePluginController};
pub use library::{Library, LibraryError};
pub use manifest::{write_manifest, BundleLoader, FormatPreference, ManifestError, PluginManifest};
