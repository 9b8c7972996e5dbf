//! Library management
//!
//! A library is a directory with a `.plugshelf/` marker and a plugins
//! directory full of bundles. It wires the configuration into the bundle
//! loader and builds lifecycle controllers from what is on disk.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::debug;

use super::config::{Config, LIBRARY_DIR};
use super::manifest::BundleLoader;
use crate::domain::PluginKind;
use crate::registry::{PluginLifecycleController, RegistryDelegate};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Not in a plugshelf library. Run 'plugshelf init' first.")]
    NotInLibrary,

    #[error("Plugins directory does not exist: {0}")]
    MissingPluginsDir(PathBuf),
}

/// A plugshelf library
pub struct Library {
    root: PathBuf,
    config: Config,
}

impl Library {
    /// Opens an existing library at the given path
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.join(LIBRARY_DIR).is_dir() {
            return Err(LibraryError::NotInLibrary.into());
        }

        // Watcher events carry canonical paths; bundle paths must match them.
        let root = root
            .canonicalize()
            .with_context(|| format!("Failed to resolve library root: {}", root.display()))?;
        let config = Config::for_library(&root)?;

        Ok(Self { root, config })
    }

    /// Opens the library at the current directory or a parent
    pub fn open_current() -> Result<Self> {
        let current = std::env::current_dir().context("Failed to read current directory")?;
        let root = Config::find_library_root(&current).ok_or(LibraryError::NotInLibrary)?;

        Self::open(root)
    }

    /// Initializes a library at the given path; existing files are kept
    pub fn init(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let library_dir = root.join(LIBRARY_DIR);

        fs::create_dir_all(&library_dir).with_context(|| {
            format!(
                "Failed to create {} directory: {}",
                LIBRARY_DIR,
                library_dir.display()
            )
        })?;

        let config_path = library_dir.join("config.toml");
        if !config_path.exists() {
            let default_config = r#"# plugshelf configuration

# Plugins directory, relative to the library root
plugins_dir = "PlugIns"

# Directories ending in this extension are plugin bundles
bundle_extension = "plugshelf"

# Manifest flavour to read: "auto", "json" or "toml"
manifest_format = "auto"

[watch]
debounce_millis = 500
"#;
            fs::write(&config_path, default_config)
                .with_context(|| format!("Failed to write config: {}", config_path.display()))?;
        }

        let library = Self::open(root)?;

        let plugins_dir = library.plugins_dir();
        fs::create_dir_all(&plugins_dir).with_context(|| {
            format!(
                "Failed to create plugins directory: {}",
                plugins_dir.display()
            )
        })?;

        Ok(library)
    }

    /// Returns the library root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the `.plugshelf` directory path
    pub fn library_dir(&self) -> PathBuf {
        self.root.join(LIBRARY_DIR)
    }

    /// Returns the plugins directory path
    pub fn plugins_dir(&self) -> PathBuf {
        self.root.join(&self.config.library.plugins_dir)
    }

    pub fn bundle_extension(&self) -> &str {
        &self.config.library.bundle_extension
    }

    /// Returns the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bundle loader configured for this library
    pub fn loader(&self) -> BundleLoader {
        BundleLoader::new(self.config.library.manifest_format, PluginKind::User)
    }

    /// Returns true if `path` looks like a bundle (by extension)
    pub fn is_bundle_path(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext == self.bundle_extension())
            .unwrap_or(false)
    }

    /// Lists bundle directories in the plugins directory, sorted by path
    pub fn scan_bundles(&self) -> Result<Vec<PathBuf>> {
        let plugins_dir = self.plugins_dir();
        if !plugins_dir.is_dir() {
            return Err(LibraryError::MissingPluginsDir(plugins_dir).into());
        }

        let entries = fs::read_dir(&plugins_dir).with_context(|| {
            format!(
                "Failed to read plugins directory: {}",
                plugins_dir.display()
            )
        })?;

        let mut bundles: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir() && self.is_bundle_path(path))
            .collect();
        bundles.sort();

        debug!(count = bundles.len(), dir = %plugins_dir.display(), "scanned bundles");
        Ok(bundles)
    }

    /// Maps any path inside the plugins directory to its bundle directory
    ///
    /// `PlugIns/Print.plugshelf/plugin.json` → `PlugIns/Print.plugshelf`.
    /// Returns `None` for paths outside the plugins directory or not inside
    /// a bundle.
    pub fn bundle_root_for(&self, path: &Path) -> Option<PathBuf> {
        let plugins_dir = self.plugins_dir();
        let relative = path.strip_prefix(&plugins_dir).ok()?;
        let first = relative.components().next()?;
        let bundle = plugins_dir.join(first);

        self.is_bundle_path(&bundle).then_some(bundle)
    }

    /// Builds a controller and loads every bundle currently on disk
    pub fn controller<D: RegistryDelegate>(
        &self,
        delegate: D,
    ) -> Result<PluginLifecycleController<BundleLoader, D>> {
        let mut controller =
            PluginLifecycleController::new(self.loader(), delegate, self.bundle_extension());
        controller.load(self.scan_bundles()?);
        Ok(controller)
    }
}
