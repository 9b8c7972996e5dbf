//! Plugin manifests
//!
//! Every bundle carries a manifest, either `plugin.json` or `plugin.toml`.
//! [`BundleLoader`] turns a bundle directory into a [`Plugin`]; it is the
//! factory handed to the lifecycle controller.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ManifestFormat, Plugin, PluginKind};
use crate::registry::PluginFactory;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("No plugin manifest found in bundle: {}", .bundle.display())]
    Missing { bundle: PathBuf },

    #[error("Failed to parse plugin manifest {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid plugin manifest {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("Failed to serialize plugin manifest: {0}")]
    Render(String),

    #[error("Failed to access plugin manifest {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Which manifest flavour the loader accepts
///
/// `Auto` tries `plugin.json` first, then `plugin.toml`. The other values
/// force one flavour and ignore the other file entirely.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FormatPreference {
    #[default]
    Auto,
    Json,
    Toml,
}

impl FormatPreference {
    /// Formats to try, in order
    pub fn candidates(&self) -> &'static [ManifestFormat] {
        match self {
            FormatPreference::Auto => &ManifestFormat::ALL,
            FormatPreference::Json => &[ManifestFormat::Json],
            FormatPreference::Toml => &[ManifestFormat::Toml],
        }
    }
}

fn default_editable() -> bool {
    true
}

/// On-disk plugin description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Display name
    pub name: String,

    /// Stable unique identifier
    pub identifier: String,

    /// Command to run, relative to the bundle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// File suffixes the plugin handles
    #[serde(default)]
    pub suffixes: Vec<String>,

    #[serde(default)]
    pub hidden: bool,

    #[serde(default = "default_editable")]
    pub editable: bool,
}

impl PluginManifest {
    /// Captures the persistable attributes of a plugin
    pub fn from_plugin(plugin: &Plugin) -> Self {
        Self {
            name: plugin.name().to_string(),
            identifier: plugin.identifier().to_string(),
            command: plugin.command().map(str::to_string),
            suffixes: plugin.suffixes().to_vec(),
            hidden: plugin.hidden(),
            editable: plugin.editable(),
        }
    }

    /// Parses manifest text in the given format; `path` is only used for errors
    pub fn parse(format: ManifestFormat, content: &str, path: &Path) -> Result<Self, ManifestError> {
        let manifest: Self = match format {
            ManifestFormat::Json => serde_json::from_str(content).map_err(|e| ManifestError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?,
            ManifestFormat::Toml => toml::from_str(content).map_err(|e| ManifestError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?,
        };

        manifest.validate(path)?;
        Ok(manifest)
    }

    /// Renders the manifest in the given format
    pub fn render(&self, format: ManifestFormat) -> Result<String, ManifestError> {
        match format {
            ManifestFormat::Json => {
                serde_json::to_string_pretty(self).map_err(|e| ManifestError::Render(e.to_string()))
            }
            ManifestFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ManifestError::Render(e.to_string()))
            }
        }
    }

    fn validate(&self, path: &Path) -> Result<(), ManifestError> {
        if self.name.trim().is_empty() {
            return Err(ManifestError::Invalid {
                path: path.to_path_buf(),
                reason: "name must not be empty".to_string(),
            });
        }
        if self.identifier.trim().is_empty() {
            return Err(ManifestError::Invalid {
                path: path.to_path_buf(),
                reason: "identifier must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Builds the in-memory plugin for a bundle
    pub fn into_plugin(self, bundle: &Path, format: ManifestFormat, kind: PluginKind) -> Plugin {
        let editable = self.editable && kind != PluginKind::Builtin;
        let mut plugin = Plugin::new(self.identifier, self.name, bundle, format)
            .with_suffixes(self.suffixes)
            .with_hidden(self.hidden)
            .with_kind(kind)
            .with_editable(editable);
        if let Some(command) = self.command {
            plugin = plugin.with_command(command);
        }
        plugin
    }
}

/// Writes a plugin's manifest back into its bundle
///
/// The file is written to a temp path first and renamed into place.
pub fn write_manifest(plugin: &Plugin) -> Result<(), ManifestError> {
    let path = plugin.manifest_path();
    let content = PluginManifest::from_plugin(plugin).render(plugin.format())?;
    let temp_path = path.with_extension("tmp");

    fs::write(&temp_path, content).map_err(|source| ManifestError::Io {
        path: temp_path.clone(),
        source,
    })?;
    fs::rename(&temp_path, &path).map_err(|source| ManifestError::Io {
        path: path.clone(),
        source,
    })
}

/// Loads bundles into plugins
#[derive(Debug, Clone, Default)]
pub struct BundleLoader {
    preference: FormatPreference,
    kind: PluginKind,
}

impl BundleLoader {
    pub fn new(preference: FormatPreference, kind: PluginKind) -> Self {
        Self { preference, kind }
    }

    /// Reads the bundle's manifest and builds a plugin
    pub fn load(&self, bundle: &Path) -> Result<Plugin, ManifestError> {
        for &format in self.preference.candidates() {
            let path = bundle.join(format.file_name());
            if !path.is_file() {
                continue;
            }

            let content = fs::read_to_string(&path).map_err(|source| ManifestError::Io {
                path: path.clone(),
                source,
            })?;
            let manifest = PluginManifest::parse(format, &content, &path)?;
            return Ok(manifest.into_plugin(bundle, format, self.kind));
        }

        Err(ManifestError::Missing {
            bundle: bundle.to_path_buf(),
        })
    }
}

impl PluginFactory for BundleLoader {
    fn make_plugin(&self, bundle: &Path) -> Result<Plugin, ManifestError> {
        self.load(bundle)
    }
}
