//! Plugin model
//!
//! A plugin is a bundle directory on disk described by a manifest. Two
//! notions of sameness apply and are kept apart on purpose:
//!
//! - **Identity** ([`Plugin::is_same`]): the same registry entry, tracked by a
//!   [`PluginHandle`] allocated when the value is constructed. Clones share it.
//! - **Equality** ([`Plugin::is_equal_to`]): the same semantic attributes,
//!   compared field by field. Two plugins loaded from the same bundle are
//!   equal but not the same.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a constructed plugin value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginHandle(u64);

impl PluginHandle {
    fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for PluginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a plugin comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PluginKind {
    /// Shipped with the host application, read-only
    Builtin,
    /// Installed into the user's plugins directory
    #[default]
    User,
}

impl PluginKind {
    pub fn as_str(&self) -> &str {
        match self {
            PluginKind::Builtin => "builtin",
            PluginKind::User => "user",
        }
    }
}

/// Manifest flavour of a bundle
///
/// Each variant knows its own manifest file name; parsing and rendering live
/// in [`crate::storage::PluginManifest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestFormat {
    Json,
    Toml,
}

impl ManifestFormat {
    /// Lookup order when a bundle is loaded without a forced format
    pub const ALL: [ManifestFormat; 2] = [ManifestFormat::Json, ManifestFormat::Toml];

    /// Manifest file name inside the bundle
    pub fn file_name(&self) -> &'static str {
        match self {
            ManifestFormat::Json => "plugin.json",
            ManifestFormat::Toml => "plugin.toml",
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ManifestFormat::Json => "json",
            ManifestFormat::Toml => "toml",
        }
    }
}

/// A discovered plugin bundle
#[derive(Debug, Clone)]
pub struct Plugin {
    handle: PluginHandle,
    identifier: String,
    name: String,
    command: Option<String>,
    suffixes: Vec<String>,
    hidden: bool,
    editable: bool,
    kind: PluginKind,
    format: ManifestFormat,
    bundle_path: PathBuf,
}

impl Plugin {
    /// Creates a plugin with a fresh identity
    pub fn new(
        identifier: impl Into<String>,
        name: impl Into<String>,
        bundle_path: impl Into<PathBuf>,
        format: ManifestFormat,
    ) -> Self {
        Self {
            handle: PluginHandle::next(),
            identifier: identifier.into(),
            name: name.into(),
            command: None,
            suffixes: Vec::new(),
            hidden: false,
            editable: true,
            kind: PluginKind::default(),
            format,
            bundle_path: bundle_path.into(),
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.suffixes = suffixes;
        self
    }

    pub fn with_kind(mut self, kind: PluginKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn handle(&self) -> PluginHandle {
        self.handle
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Changes the display name.
    ///
    /// Does not re-key any registry holding this plugin; go through
    /// [`crate::registry::PluginLifecycleController::rename`] for that.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    pub fn set_command(&mut self, command: Option<String>) {
        self.command = command;
    }

    /// Absolute path of the command inside the bundle
    pub fn command_path(&self) -> Option<PathBuf> {
        self.command.as_ref().map(|c| self.bundle_path.join(c))
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn set_suffixes(&mut self, suffixes: Vec<String>) {
        self.suffixes = suffixes;
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn editable(&self) -> bool {
        self.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.editable = editable;
    }

    pub fn kind(&self) -> PluginKind {
        self.kind
    }

    pub fn format(&self) -> ManifestFormat {
        self.format
    }

    /// The bundle directory (the plugin's resource location)
    pub fn bundle_path(&self) -> &Path {
        &self.bundle_path
    }

    /// Path of the manifest file inside the bundle
    pub fn manifest_path(&self) -> PathBuf {
        self.bundle_path.join(self.format.file_name())
    }

    /// Identity: true if both values stand for the same registry entry
    pub fn is_same(&self, other: &Plugin) -> bool {
        self.handle == other.handle
    }

    /// Attribute equality, independent of identity
    pub fn is_equal_to(&self, other: &Plugin) -> bool {
        self.name == other.name
            && self.identifier == other.identifier
            && self.editable == other.editable
            && self.kind == other.kind
            && self.command == other.command
            && self.command_path() == other.command_path()
            && self.bundle_path == other.bundle_path
            && self.format == other.format
    }

    pub(crate) fn set_identifier(&mut self, identifier: impl Into<String>) {
        self.identifier = identifier.into();
    }

    pub(crate) fn set_bundle_path(&mut self, bundle_path: impl Into<PathBuf>) {
        self.bundle_path = bundle_path.into();
    }

    /// Takes every attribute from `other` but keeps this plugin's identity
    pub(crate) fn refresh_from(&mut self, other: Plugin) {
        let handle = self.handle;
        *self = Plugin { handle, ..other };
    }
}
