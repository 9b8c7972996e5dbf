//! Keyed plugin registry
//!
//! An insertion-ordered map from key (normally the plugin's display name at
//! insertion time) to plugin. Keys are never recomputed behind the caller's
//! back: if a stored plugin's name changes, it stays under its old key until
//! it is removed and re-inserted.

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;

use crate::domain::{Plugin, PluginHandle};

/// In-memory index of plugins by key
#[derive(Debug, Clone, Default)]
pub struct KeyedRegistry {
    entries: IndexMap<String, Plugin>,
}

impl KeyedRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry keyed by each plugin's current name.
    ///
    /// Later plugins win over earlier ones with the same name.
    pub fn from_plugins(plugins: impl IntoIterator<Item = Plugin>) -> Self {
        let mut registry = Self::new();
        registry.extend(plugins);
        registry
    }

    /// Stores `plugin` under `key`, replacing whatever was there
    pub fn insert(&mut self, plugin: Plugin, key: impl Into<String>) {
        self.entries.insert(key.into(), plugin);
    }

    /// Stores `plugin` under its current name
    pub fn insert_by_name(&mut self, plugin: Plugin) {
        let key = plugin.name().to_string();
        self.insert(plugin, key);
    }

    /// Inserts every plugin under its current name, in order
    pub fn extend(&mut self, plugins: impl IntoIterator<Item = Plugin>) {
        for plugin in plugins {
            self.insert_by_name(plugin);
        }
    }

    /// Removes every entry holding `plugin`; returns the stored value if any
    pub fn remove(&mut self, plugin: &Plugin) -> Option<Plugin> {
        self.remove_handle(plugin.handle())
    }

    pub(crate) fn remove_handle(&mut self, handle: PluginHandle) -> Option<Plugin> {
        let mut removed = None;
        self.entries.retain(|_, stored| {
            if stored.handle() == handle {
                removed = Some(stored.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// Removes and returns the entry at `key`
    pub fn remove_key(&mut self, key: &str) -> Option<Plugin> {
        self.entries.shift_remove(key)
    }

    /// Returns the plugin stored at `key`
    pub fn lookup(&self, key: &str) -> Option<&Plugin> {
        self.entries.get(key)
    }

    /// Identity membership, independent of key
    pub fn contains(&self, plugin: &Plugin) -> bool {
        self.entries.values().any(|stored| stored.is_same(plugin))
    }

    /// Returns true if some entry uses `key`
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the key and plugin whose bundle lives at `path`
    pub fn find_by_path(&self, path: &Path) -> Option<(&str, &Plugin)> {
        self.entries
            .iter()
            .find(|(_, plugin)| plugin.bundle_path() == path)
            .map(|(key, plugin)| (key.as_str(), plugin))
    }

    /// Snapshot of the stored plugins in insertion order, one per identity
    pub fn all(&self) -> Vec<Plugin> {
        let mut seen: HashSet<PluginHandle> = HashSet::with_capacity(self.entries.len());
        self.entries
            .values()
            .filter(|plugin| seen.insert(plugin.handle()))
            .cloned()
            .collect()
    }

    /// Iterates over `(key, plugin)` entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Plugin)> {
        self.entries.iter().map(|(key, plugin)| (key.as_str(), plugin))
    }

    /// Number of entries (keys)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
