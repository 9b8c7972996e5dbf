//! Plugin duplication
//!
//! Copies a registered plugin's bundle into a new, independent plugin:
//!
//! 1. Copy the bundle to `<source identifier>.<ext>` (the staging name the
//!    self-duplicate check recognises, so watchers ignore it)
//! 2. Give the copy a fresh identifier and a unique name, rewrite its manifest
//! 3. Rename the staging directory to `<new identifier>.<ext>`
//! 4. Register the copy with the controller
//!
//! Staging is serialized across processes with an `fs2` lock on
//! `<plugins dir>/.duplicate.lock`.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

use super::library::Library;
use super::manifest::{write_manifest, ManifestError};
use crate::domain::{new_identifier, Plugin};
use crate::registry::{duplicate_path, PluginFactory, PluginLifecycleController, RegistryDelegate};

/// Lock file guarding the staging step
const LOCK_FILE: &str = ".duplicate.lock";

#[derive(Debug, Error)]
pub enum DuplicateError {
    #[error("Plugin not found: {0}")]
    NotRegistered(String),

    #[error("Duplicate destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    #[error("Failed to copy plugin bundle {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Duplicates plugins within one plugins directory
#[derive(Debug, Clone)]
pub struct DuplicatePluginController {
    plugins_dir: PathBuf,
    bundle_extension: String,
}

impl DuplicatePluginController {
    pub fn new(plugins_dir: impl Into<PathBuf>, bundle_extension: impl Into<String>) -> Self {
        Self {
            plugins_dir: plugins_dir.into(),
            bundle_extension: bundle_extension.into(),
        }
    }

    /// Creates a duplicator for a library's plugins directory
    pub fn for_library(library: &Library) -> Self {
        Self::new(library.plugins_dir(), library.bundle_extension())
    }

    /// Duplicates the plugin registered as `name` and registers the copy.
    ///
    /// Returns the registered copy. On failure nothing is registered and the
    /// staging directory is removed.
    pub fn duplicate<F, D>(
        &self,
        name: &str,
        controller: &mut PluginLifecycleController<F, D>,
    ) -> Result<Plugin, DuplicateError>
    where
        F: PluginFactory,
        D: RegistryDelegate,
    {
        let source = controller
            .plugin_named(name)
            .cloned()
            .ok_or_else(|| DuplicateError::NotRegistered(name.to_string()))?;

        let _lock = self.lock()?;

        let staging = duplicate_path(&self.plugins_dir, source.identifier(), &self.bundle_extension);
        if staging.exists() {
            return Err(DuplicateError::DestinationExists(staging));
        }

        let copy = match self.stage_copy(&source, &staging, controller) {
            Ok(copy) => copy,
            Err(error) => {
                warn!(bundle = %staging.display(), %error, "duplicate failed, cleaning up");
                discard_staging(&staging);
                return Err(error);
            }
        };

        let registered = controller.register(copy);
        info!(source = source.name(), copy = %registered, "duplicated plugin");

        controller
            .plugin_named(&registered)
            .cloned()
            .ok_or(DuplicateError::NotRegistered(registered))
    }

    /// Copies the bundle to `staging`, re-identifies it and moves it into place
    fn stage_copy<F, D>(
        &self,
        source: &Plugin,
        staging: &Path,
        controller: &PluginLifecycleController<F, D>,
    ) -> Result<Plugin, DuplicateError>
    where
        F: PluginFactory,
        D: RegistryDelegate,
    {
        copy_bundle(source.bundle_path(), staging)?;

        let mut copy = controller.factory().make_plugin(staging)?;
        let identifier = new_identifier(source.name(), Utc::now());
        let name = controller.unique_name(source.name(), &copy);
        copy.set_identifier(identifier.as_str());
        copy.set_name(name);
        copy.set_editable(true);
        write_manifest(&copy)?;

        let destination = duplicate_path(&self.plugins_dir, &identifier, &self.bundle_extension);
        if destination.exists() {
            return Err(DuplicateError::DestinationExists(destination));
        }
        fs::rename(staging, &destination).map_err(|source| DuplicateError::Io {
            path: destination.clone(),
            source,
        })?;
        copy.set_bundle_path(destination);

        Ok(copy)
    }

    fn lock(&self) -> Result<fs::File, DuplicateError> {
        let lock_path = self.plugins_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|source| DuplicateError::Io {
                path: lock_path.clone(),
                source,
            })?;

        // Lock is released when the file is dropped
        file.lock_exclusive().map_err(|source| DuplicateError::Io {
            path: lock_path,
            source,
        })?;
        Ok(file)
    }
}

/// Removes a half-built staging copy; returns false if it could not be removed
///
/// A leftover staging directory blocks the next duplicate of the same plugin.
fn discard_staging(staging: &Path) -> bool {
    match fs::remove_dir_all(staging) {
        Ok(()) => true,
        Err(error) if error.kind() == io::ErrorKind::NotFound => true,
        Err(error) => {
            warn!(
                bundle = %staging.display(),
                %error,
                "could not remove staging copy; delete it by hand"
            );
            false
        }
    }
}

/// Recursively copies a bundle directory
fn copy_bundle(from: &Path, to: &Path) -> Result<(), DuplicateError> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| DuplicateError::Io {
            path: from.to_path_buf(),
            source: e.into(),
        })?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);

        let result = if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
        } else {
            fs::copy(entry.path(), &target).map(|_| ())
        };
        result.map_err(|source| DuplicateError::Io {
            path: target,
            source,
        })?;
    }
    Ok(())
}
