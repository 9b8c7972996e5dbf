//! Self-duplicate detection
//!
//! The duplicate operation stages its copy at `<identifier>.<extension>`,
//! named after the *source* plugin. When the watcher later reports that
//! path, it must not be registered as a new plugin.

use std::path::{Path, PathBuf};

use super::KeyedRegistry;

/// Bundle file name a duplicate of `identifier` is staged under
pub fn duplicate_filename(identifier: &str, bundle_extension: &str) -> String {
    format!("{}.{}", identifier, bundle_extension)
}

/// Full staging path of a duplicate inside `plugins_dir`
pub fn duplicate_path(plugins_dir: &Path, identifier: &str, bundle_extension: &str) -> PathBuf {
    plugins_dir.join(duplicate_filename(identifier, bundle_extension))
}

/// Returns true if `path` is a copy the system made of a registered plugin.
///
/// That is: the file name minus `.<bundle_extension>` equals the identifier
/// of a registered plugin living somewhere else.
pub fn is_self_duplicate(path: &Path, registry: &KeyedRegistry, bundle_extension: &str) -> bool {
    let Some(stem) = bundle_stem(path, bundle_extension) else {
        return false;
    };

    registry
        .iter()
        .any(|(_, plugin)| plugin.identifier() == stem && plugin.bundle_path() != path)
}

/// File name of `path` without its bundle extension, if it has that extension
fn bundle_stem<'a>(path: &'a Path, bundle_extension: &str) -> Option<&'a str> {
    if path.extension()?.to_str()? != bundle_extension {
        return None;
    }
    path.file_stem()?.to_str()
}
