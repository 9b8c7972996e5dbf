//! Domain models for plugshelf
//!
//! Contains the plugin model without any I/O concerns.

mod id;
mod plugin;

pub use id::{is_generated_identifier, new_identifier};
pub use plugin::{ManifestFormat, Plugin, PluginHandle, PluginKind};
