//! Unique plugin name resolution
//!
//! Given a desired name, tries `"<name>"`, `"<name> 2"`, … `"<name> 99"`
//! against the registry and returns the first one that is free (or already
//! held by the plugin being named). When all of them are taken the plugin's
//! identifier is used instead, so resolution always terminates with a usable
//! name.

use crate::domain::Plugin;

use super::KeyedRegistry;

/// First numeric suffix tried after the bare name
pub const FIRST_SUFFIX: u32 = 2;

/// Last numeric suffix tried before falling back to the identifier
pub const LAST_SUFFIX: u32 = 99;

/// Returns a name for `plugin` that no other plugin in `registry` uses
pub fn unique_name(desired: &str, plugin: &Plugin, registry: &KeyedRegistry) -> String {
    if is_available(desired, plugin, registry) {
        return desired.to_string();
    }

    (FIRST_SUFFIX..=LAST_SUFFIX)
        .map(|suffix| suffixed_name(desired, suffix))
        .find(|candidate| is_available(candidate, plugin, registry))
        .unwrap_or_else(|| plugin.identifier().to_string())
}

/// Formats a numbered candidate, e.g. `Print 2`
pub fn suffixed_name(name: &str, suffix: u32) -> String {
    format!("{} {}", name, suffix)
}

fn is_available(name: &str, plugin: &Plugin, registry: &KeyedRegistry) -> bool {
    registry
        .lookup(name)
        .map_or(true, |holder| holder.is_same(plugin))
}
