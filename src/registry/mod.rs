//! # Plugin Registry
//!
//! The in-memory side of plugshelf: keeps a keyed index of plugins in step
//! with bundle events coming from disk.
//!
//! ## Data Flow
//!
//! ```text
//! watcher event ──▶ PluginLifecycleController
//!                      │
//!                      ├── duplicate::is_self_duplicate   (suppress or proceed)
//!                      ├── PluginFactory::make_plugin     (manifest → Plugin)
//!                      ├── names::unique_name             (collision-free name)
//!                      ├── KeyedRegistry                  (insert / remove / re-key)
//!                      └── RegistryDelegate               (added / removed / renamed)
//! ```
//!
//! Nothing in this module touches the file system.
//!
//! ## Key Types
//!
//! - [`KeyedRegistry`] - Ordered name → plugin index
//! - [`PluginLifecycleController`] - Applies [`BundleEvent`]s to the registry
//! - [`RegistryDelegate`] - Receives change notifications

mod controller;
mod duplicate;
mod keyed;
mod names;

pub use controller::{
    BundleEvent, EventOutcome, Notification, PluginFactory, PluginLifecycleController,
    RecordingDelegate, RegistryDelegate,
};
pub use duplicate::{duplicate_filename, duplicate_path, is_self_duplicate};
pub use keyed::KeyedRegistry;
pub use names::{suffixed_name, unique_name, FIRST_SUFFIX, LAST_SUFFIX};
