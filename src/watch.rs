//! File-system watching
//!
//! Watches a library's plugins directory with a debounced `notify` watcher and
//! turns each batch of changed paths into [`BundleEvent`]s. The watcher thread
//! only sends batches over a channel; events are classified and applied on the
//! thread that owns the controller, one at a time.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use tracing::{debug, info, warn};

use crate::registry::{BundleEvent, EventOutcome, PluginFactory, PluginLifecycleController, RegistryDelegate};
use crate::storage::Library;

/// Bundle directories touched by a batch of changed paths, in first-seen order
pub fn touched_bundles<'a>(library: &Library, paths: impl IntoIterator<Item = &'a Path>) -> Vec<PathBuf> {
    let mut bundles: Vec<PathBuf> = Vec::new();
    for path in paths {
        if let Some(bundle) = library.bundle_root_for(path) {
            if !bundles.contains(&bundle) {
                bundles.push(bundle);
            }
        }
    }
    bundles
}

/// Decides which event a touched bundle directory represents right now
///
/// Returns `None` when the path exists but is not a directory.
pub fn classify<F, D>(bundle: &Path, controller: &PluginLifecycleController<F, D>) -> Option<BundleEvent>
where
    F: PluginFactory,
    D: RegistryDelegate,
{
    if !bundle.exists() {
        return Some(BundleEvent::Removed(bundle.to_path_buf()));
    }
    if !bundle.is_dir() {
        return None;
    }

    if controller.plugin_at(bundle).is_some() {
        Some(BundleEvent::Modified(bundle.to_path_buf()))
    } else {
        Some(BundleEvent::Appeared(bundle.to_path_buf()))
    }
}

/// Classifies and applies one batch of changed paths
///
/// `on_event` sees every applied event; returning `Break` stops the batch
/// and is passed back to the caller.
pub fn apply_batch<'a, F, D>(
    library: &Library,
    controller: &mut PluginLifecycleController<F, D>,
    paths: impl IntoIterator<Item = &'a Path>,
    on_event: &mut impl FnMut(&mut PluginLifecycleController<F, D>, &BundleEvent, &EventOutcome) -> ControlFlow<()>,
) -> ControlFlow<()>
where
    F: PluginFactory,
    D: RegistryDelegate,
{
    for bundle in touched_bundles(library, paths) {
        let Some(event) = classify(&bundle, controller) else {
            debug!(path = %bundle.display(), "ignoring non-directory bundle path");
            continue;
        };

        let outcome = controller.handle(event.clone());
        debug!(?event, ?outcome, "applied bundle event");
        if on_event(controller, &event, &outcome).is_break() {
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

/// Watches the library until the watcher stops or `on_event` breaks
pub fn watch<F, D>(
    library: &Library,
    controller: &mut PluginLifecycleController<F, D>,
    mut on_event: impl FnMut(&mut PluginLifecycleController<F, D>, &BundleEvent, &EventOutcome) -> ControlFlow<()>,
) -> Result<()>
where
    F: PluginFactory,
    D: RegistryDelegate,
{
    let plugins_dir = library.plugins_dir();
    let debounce = Duration::from_millis(library.config().library.watch.debounce_millis);

    // Set up file watcher with debouncing
    let (tx, rx) = mpsc::channel();
    let mut debouncer = new_debouncer(debounce, tx).context("Failed to create file watcher")?;
    debouncer
        .watcher()
        .watch(&plugins_dir, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", plugins_dir.display()))?;

    info!(dir = %plugins_dir.display(), debounce_ms = debounce.as_millis() as u64, "watching plugins");

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let paths: Vec<PathBuf> = events.into_iter().map(|event| event.path).collect();
                debug!(count = paths.len(), "received change batch");

                let flow = apply_batch(
                    library,
                    controller,
                    paths.iter().map(PathBuf::as_path),
                    &mut on_event,
                );
                if flow.is_break() {
                    break;
                }
            }
            Ok(Err(error)) => {
                warn!(?error, "watch error");
            }
            Err(_) => {
                info!("watcher channel closed");
                break;
            }
        }
    }

    Ok(())
}
