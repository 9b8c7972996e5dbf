//! plugshelf - a live registry of plugin bundles
//!
//! A library is a directory holding plugin bundles (`Name.plugshelf/` folders
//! with a manifest). plugshelf keeps an in-memory registry of those plugins
//! keyed by unique display name, keeps it in sync with the file system as
//! bundles appear, change and disappear, and can duplicate or rename plugins
//! without ever letting two of them share a name.

pub mod domain;
pub mod registry;
pub mod storage;
pub mod watch;
pub mod cli;

pub use domain::{ManifestFormat, Plugin, PluginHandle, PluginKind};
pub use registry::{KeyedRegistry, PluginLifecycleController, RegistryDelegate};
pub use storage::{Library, ManifestError};
