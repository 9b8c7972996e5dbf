//! Plugin lifecycle controller
//!
//! Owns the [`KeyedRegistry`] and applies bundle events from the watcher to
//! it. Each managed bundle path moves between three states:
//!
//! ```text
//!            appeared (not a self-duplicate)
//! Unknown ─────────────────────────────────▶ Registered ──┐ modified / rename
//!                                                │   ▲    │ (re-keyed)
//!                                        removed │   └────┘
//!                                                ▼
//!                                             Removed
//! ```
//!
//! The controller takes `&mut self` for every mutation. Events from other
//! threads must be funnelled into the thread that owns it (see
//! [`crate::watch`]); there is no internal locking.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::domain::Plugin;
use crate::storage::ManifestError;

use super::{duplicate, names, KeyedRegistry};

/// A change to a bundle path reported by the file-system watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleEvent {
    Appeared(PathBuf),
    Removed(PathBuf),
    Modified(PathBuf),
}

impl BundleEvent {
    pub fn path(&self) -> &Path {
        match self {
            BundleEvent::Appeared(path) | BundleEvent::Removed(path) | BundleEvent::Modified(path) => {
                path
            }
        }
    }
}

/// What applying an event did to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// A new plugin was registered under the given name
    Added(String),
    /// The plugin with the given name was removed
    Removed(String),
    /// A registered plugin was reloaded and now lives under the given name
    Updated(String),
    /// The path is a copy made by the duplicate operation
    Suppressed,
    /// Nothing to do (already registered, or unknown removal)
    Ignored,
    /// The bundle's manifest could not be loaded
    Failed,
}

/// Builds plugins from bundle paths
pub trait PluginFactory {
    fn make_plugin(&self, bundle: &Path) -> Result<Plugin, ManifestError>;
}

impl<F> PluginFactory for F
where
    F: Fn(&Path) -> Result<Plugin, ManifestError>,
{
    fn make_plugin(&self, bundle: &Path) -> Result<Plugin, ManifestError> {
        self(bundle)
    }
}

/// Receives net registry changes, synchronously and in mutation order
pub trait RegistryDelegate {
    fn plugin_added(&mut self, plugin: &Plugin);

    fn plugin_removed(&mut self, plugin: &Plugin);

    /// The requested name was taken; `plugin` now carries `new_name`
    fn plugin_renamed(&mut self, plugin: &Plugin, old_name: &str, new_name: &str);

    fn plugin_load_failed(&mut self, bundle: &Path, error: &ManifestError);
}

/// A delegate notification, as recorded by [`RecordingDelegate`]
#[derive(Debug, Clone)]
pub enum Notification {
    Added(Plugin),
    Removed(Plugin),
    Renamed {
        plugin: Plugin,
        old_name: String,
        new_name: String,
    },
    LoadFailed {
        bundle: PathBuf,
        reason: String,
    },
}

/// Delegate that queues every notification for later inspection
#[derive(Debug, Default)]
pub struct RecordingDelegate {
    notifications: Vec<Notification>,
}

impl RecordingDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Drains the queued notifications
    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}

impl RegistryDelegate for RecordingDelegate {
    fn plugin_added(&mut self, plugin: &Plugin) {
        self.notifications.push(Notification::Added(plugin.clone()));
    }

    fn plugin_removed(&mut self, plugin: &Plugin) {
        self.notifications.push(Notification::Removed(plugin.clone()));
    }

    fn plugin_renamed(&mut self, plugin: &Plugin, old_name: &str, new_name: &str) {
        self.notifications.push(Notification::Renamed {
            plugin: plugin.clone(),
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
        });
    }

    fn plugin_load_failed(&mut self, bundle: &Path, error: &ManifestError) {
        self.notifications.push(Notification::LoadFailed {
            bundle: bundle.to_path_buf(),
            reason: error.to_string(),
        });
    }
}

/// Keeps the registry in step with the bundles on disk
pub struct PluginLifecycleController<F, D> {
    registry: KeyedRegistry,
    factory: F,
    delegate: D,
    bundle_extension: String,
}

impl<F: PluginFactory, D: RegistryDelegate> PluginLifecycleController<F, D> {
    /// Creates a controller with an empty registry
    pub fn new(factory: F, delegate: D, bundle_extension: impl Into<String>) -> Self {
        Self {
            registry: KeyedRegistry::new(),
            factory,
            delegate,
            bundle_extension: bundle_extension.into(),
        }
    }

    /// Rebuilds the registry from the given bundles, in order.
    ///
    /// Every bundle is parsed before any is registered. Bundles named after
    /// another bundle's identifier are registered last, so a leftover copy
    /// never claims the name of the plugin it was copied from, whatever the
    /// path order. Load failures still reach the delegate; nothing else is
    /// notified. Returns the number of registered plugins.
    pub fn load(&mut self, bundles: impl IntoIterator<Item = PathBuf>) -> usize {
        self.registry.clear();

        let mut parsed = KeyedRegistry::new();
        for bundle in bundles {
            let key = bundle.to_string_lossy().into_owned();
            if parsed.contains_key(&key) {
                continue;
            }

            match self.factory.make_plugin(&bundle) {
                Ok(plugin) => parsed.insert(plugin, key),
                Err(error) => {
                    warn!(bundle = %bundle.display(), %error, "failed to load plugin");
                    self.delegate.plugin_load_failed(&bundle, &error);
                }
            }
        }

        let (copies, originals): (Vec<Plugin>, Vec<Plugin>) =
            parsed.all().into_iter().partition(|plugin| {
                duplicate::is_self_duplicate(plugin.bundle_path(), &parsed, &self.bundle_extension)
            });

        for plugin in originals {
            self.insert_loaded(plugin);
        }
        for plugin in copies {
            if self.is_self_duplicate(plugin.bundle_path()) {
                debug!(bundle = %plugin.bundle_path().display(), "skipping self-duplicate during load");
                continue;
            }
            self.insert_loaded(plugin);
        }

        info!(count = self.registry.len(), "loaded plugins");
        self.registry.len()
    }

    fn insert_loaded(&mut self, mut plugin: Plugin) {
        let name = names::unique_name(plugin.name(), &plugin, &self.registry);
        plugin.set_name(name.clone());
        self.registry.insert(plugin, name);
    }

    /// Applies one watcher event
    pub fn handle(&mut self, event: BundleEvent) -> EventOutcome {
        match event {
            BundleEvent::Appeared(path) => self.bundle_appeared(&path),
            BundleEvent::Removed(path) => self.bundle_removed(&path),
            BundleEvent::Modified(path) => self.bundle_modified(&path),
        }
    }

    /// A bundle showed up on disk
    pub fn bundle_appeared(&mut self, path: &Path) -> EventOutcome {
        if self.registry.find_by_path(path).is_some() {
            debug!(bundle = %path.display(), "bundle already registered");
            return EventOutcome::Ignored;
        }

        if self.is_self_duplicate(path) {
            info!(bundle = %path.display(), "suppressing self-duplicate");
            return EventOutcome::Suppressed;
        }

        match self.factory.make_plugin(path) {
            Ok(plugin) => EventOutcome::Added(self.register(plugin)),
            Err(error) => {
                warn!(bundle = %path.display(), %error, "failed to load plugin");
                self.delegate.plugin_load_failed(path, &error);
                EventOutcome::Failed
            }
        }
    }

    /// A bundle went away. Unknown paths are ignored.
    pub fn bundle_removed(&mut self, path: &Path) -> EventOutcome {
        let Some(handle) = self.registry.find_by_path(path).map(|(_, p)| p.handle()) else {
            debug!(bundle = %path.display(), "removal of unknown bundle");
            return EventOutcome::Ignored;
        };

        match self.registry.remove_handle(handle) {
            Some(plugin) => {
                info!(name = plugin.name(), bundle = %path.display(), "removed plugin");
                self.delegate.plugin_removed(&plugin);
                EventOutcome::Removed(plugin.name().to_string())
            }
            None => EventOutcome::Ignored,
        }
    }

    /// A bundle's contents changed; reloads it and re-keys by its new name.
    ///
    /// An unknown path is treated as a new bundle. If the reload fails the
    /// registered plugin is left as it was.
    pub fn bundle_modified(&mut self, path: &Path) -> EventOutcome {
        let Some(key) = self.registry.find_by_path(path).map(|(key, _)| key.to_string()) else {
            return self.bundle_appeared(path);
        };

        match self.factory.make_plugin(path) {
            Ok(fresh) => {
                let requested = fresh.name().to_string();
                match self.rekey(&key, &requested, Some(fresh)) {
                    Some(name) => EventOutcome::Updated(name),
                    None => EventOutcome::Ignored,
                }
            }
            Err(error) => {
                warn!(bundle = %path.display(), %error, "failed to reload plugin");
                self.delegate.plugin_load_failed(path, &error);
                EventOutcome::Failed
            }
        }
    }

    /// Renames the plugin registered as `current`.
    ///
    /// Returns the name it ended up with, which differs from `requested`
    /// when that was taken, or `None` if no plugin is registered as `current`.
    pub fn rename(&mut self, current: &str, requested: &str) -> Option<String> {
        self.rekey(current, requested, None)
    }

    /// Registers a plugin built elsewhere, giving it a unique name
    pub fn register(&mut self, mut plugin: Plugin) -> String {
        let name = names::unique_name(plugin.name(), &plugin, &self.registry);
        if name != plugin.name() {
            debug!(requested = plugin.name(), resolved = %name, "disambiguated plugin name");
        }
        plugin.set_name(name.clone());

        info!(name = %name, identifier = plugin.identifier(), "registered plugin");
        self.registry.insert(plugin.clone(), name.clone());
        self.delegate.plugin_added(&plugin);
        name
    }

    fn rekey(&mut self, key: &str, requested: &str, fresh: Option<Plugin>) -> Option<String> {
        let mut plugin = self.registry.remove_key(key)?;
        if let Some(fresh) = fresh {
            plugin.refresh_from(fresh);
        }

        let name = names::unique_name(requested, &plugin, &self.registry);
        plugin.set_name(name.clone());
        debug!(from = key, to = %name, "re-keyed plugin");
        self.registry.insert(plugin.clone(), name.clone());

        if name != requested {
            info!(requested, resolved = %name, "plugin name was taken");
            self.delegate.plugin_renamed(&plugin, requested, &name);
        }
        Some(name)
    }

    /// Unique name `desired` would resolve to for `plugin` right now
    pub fn unique_name(&self, desired: &str, plugin: &Plugin) -> String {
        names::unique_name(desired, plugin, &self.registry)
    }

    /// True if `path` is a copy staged by the duplicate operation
    pub fn is_self_duplicate(&self, path: &Path) -> bool {
        duplicate::is_self_duplicate(path, &self.registry, &self.bundle_extension)
    }

    pub fn plugin_named(&self, name: &str) -> Option<&Plugin> {
        self.registry.lookup(name)
    }

    pub fn plugin_at(&self, bundle: &Path) -> Option<&Plugin> {
        self.registry.find_by_path(bundle).map(|(_, plugin)| plugin)
    }

    /// Snapshot of all registered plugins
    pub fn plugins(&self) -> Vec<Plugin> {
        self.registry.all()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    pub fn registry(&self) -> &KeyedRegistry {
        &self.registry
    }

    pub fn bundle_extension(&self) -> &str {
        &self.bundle_extension
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn delegate(&self) -> &D {
        &self.delegate
    }

    pub fn delegate_mut(&mut self) -> &mut D {
        &mut self.delegate
    }
}
