//! Configuration handling for plugshelf
//!
//! Configuration is stored in `.plugshelf/config.toml` (library) and
//! `~/.config/plugshelf/config.toml` (global).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::manifest::FormatPreference;

/// Name of the marker directory at a library root
pub const LIBRARY_DIR: &str = ".plugshelf";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Configuration for the file-system watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds before events are applied
    pub debounce_millis: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_millis: 500,
        }
    }
}

/// Library-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Plugins directory, relative to the library root
    pub plugins_dir: PathBuf,

    /// Extension that marks a directory as a plugin bundle
    pub bundle_extension: String,

    /// Which manifest flavour to read
    pub manifest_format: FormatPreference,

    /// Watcher settings
    pub watch: WatchConfig,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            plugins_dir: PathBuf::from("PlugIns"),
            bundle_extension: "plugshelf".to_string(),
            manifest_format: FormatPreference::Auto,
            watch: WatchConfig::default(),
        }
    }
}

impl LibraryConfig {
    /// Checks values that would make bundle paths ambiguous
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ext = &self.bundle_extension;
        if ext.is_empty() || ext.contains('.') || ext.contains('/') || ext.contains('\\') {
            return Err(ConfigError::Invalid(format!(
                "bundle_extension must be a single non-empty extension, got '{}'",
                ext
            )));
        }
        if self.plugins_dir.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "plugins_dir must be relative to the library root, got '{}'",
                self.plugins_dir.display()
            )));
        }
        Ok(())
    }
}

/// Global user configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default output format (text or json)
    pub default_format: OutputFormat,
}

/// Output format for commands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Combined configuration (global + library)
#[derive(Debug, Clone)]
pub struct Config {
    pub library: LibraryConfig,
    pub global: GlobalConfig,
}

impl Config {
    /// Loads configuration for a specific library
    pub fn for_library(library_root: &Path) -> Result<Self> {
        let global = Self::load_global()?;
        let library = Self::load_library_config(library_root)?;

        Ok(Self { library, global })
    }

    /// Returns the global config directory
    pub fn global_config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "plugshelf", "plugshelf")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Loads global configuration
    pub fn load_global() -> Result<GlobalConfig> {
        let config_dir = match Self::global_config_dir() {
            Some(dir) => dir,
            None => return Ok(GlobalConfig::default()),
        };

        let config_path = config_dir.join("config.toml");
        if !config_path.exists() {
            return Ok(GlobalConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read global config: {}", config_path.display()))?;

        toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse global config")
    }

    /// Loads library configuration from a specific root
    fn load_library_config(library_root: &Path) -> Result<LibraryConfig> {
        let config_path = library_root.join(LIBRARY_DIR).join("config.toml");

        if !config_path.exists() {
            return Ok(LibraryConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read library config: {}", config_path.display()))?;

        let config: LibraryConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .context("Failed to parse library config")?;
        config.validate()?;

        Ok(config)
    }

    /// Finds the library root by looking for a `.plugshelf/` directory
    pub fn find_library_root(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();

        loop {
            if current.join(LIBRARY_DIR).is_dir() {
                return Some(current);
            }

            if !current.pop() {
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config() {
        let config = LibraryConfig::default();

        assert_eq!(config.plugins_dir, PathBuf::from("PlugIns"));
        assert_eq!(config.bundle_extension, "plugshelf");
        assert_eq!(config.manifest_format, FormatPreference::Auto);
        assert_eq!(config.watch.debounce_millis, 500);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_library_config() {
        let toml = r#"
plugins_dir = "Extensions"
bundle_extension = "bundle"
manifest_format = "toml"

[watch]
debounce_millis = 50
"#;

        let config: LibraryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.plugins_dir, PathBuf::from("Extensions"));
        assert_eq!(config.bundle_extension, "bundle");
        assert_eq!(config.manifest_format, FormatPreference::Toml);
        assert_eq!(config.watch.debounce_millis, 50);
    }

    #[test]
    fn partial_library_config_uses_defaults() {
        let config: LibraryConfig = toml::from_str("manifest_format = \"json\"\n").unwrap();

        assert_eq!(config.manifest_format, FormatPreference::Json);
        assert_eq!(config.bundle_extension, "plugshelf");
    }

    #[test]
    fn parse_global_config() {
        let config: GlobalConfig = toml::from_str("default_format = \"json\"\n").unwrap();
        assert_eq!(config.default_format, OutputFormat::Json);
    }

    #[test]
    fn rejects_bad_extension() {
        let config = LibraryConfig {
            bundle_extension: "tar.gz".to_string(),
            ..LibraryConfig::default()
        };
        assert!(config.validate().is_err());

        let config = LibraryConfig {
            bundle_extension: String::new(),
            ..LibraryConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_config_file_fails_to_load() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(LIBRARY_DIR)).unwrap();
        fs::write(
            dir.path().join(LIBRARY_DIR).join("config.toml"),
            "bundle_extension = \"a.b\"\n",
        )
        .unwrap();

        assert!(Config::for_library(dir.path()).is_err());
    }

    #[test]
    fn find_library_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(LIBRARY_DIR)).unwrap();

        let sub_dir = dir.path().join("sub").join("dir");
        fs::create_dir_all(&sub_dir).unwrap();

        let root = Config::find_library_root(&sub_dir);
        assert_eq!(root.as_deref(), Some(dir.path()));
    }

    #[test]
    fn library_config_is_read_from_disk() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(LIBRARY_DIR)).unwrap();
        fs::write(
            dir.path().join(LIBRARY_DIR).join("config.toml"),
            "manifest_format = \"toml\"\n[watch]\ndebounce_millis = 20\n",
        )
        .unwrap();

        let config = Config::for_library(dir.path()).unwrap();
        assert_eq!(config.library.manifest_format, FormatPreference::Toml);
        assert_eq!(config.library.watch.debounce_millis, 20);
        assert_eq!(config.library.bundle_extension, "plugshelf");
    }
}
