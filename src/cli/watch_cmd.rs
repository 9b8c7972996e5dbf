//! Watch command: reports plugin changes as they happen

use std::ops::ControlFlow;

use anyhow::Result;

use super::output::Output;
use crate::registry::{Notification, RecordingDelegate};
use crate::storage::Library;
use crate::watch;

/// Formats a notification as one text line
fn describe(notification: &Notification) -> String {
    match notification {
        Notification::Added(plugin) => format!("added    {}", plugin.name()),
        Notification::Removed(plugin) => format!("removed  {}", plugin.name()),
        Notification::Renamed { old_name, new_name, .. } => {
            format!("renamed  {} -> {}", old_name, new_name)
        }
        Notification::LoadFailed { bundle, reason } => {
            format!("failed   {} ({})", bundle.display(), reason)
        }
    }
}

/// Formats a notification as a JSON event
fn to_json(notification: &Notification) -> serde_json::Value {
    match notification {
        Notification::Added(plugin) => serde_json::json!({
            "event": "added",
            "name": plugin.name(),
            "identifier": plugin.identifier(),
            "path": plugin.bundle_path().display().to_string(),
        }),
        Notification::Removed(plugin) => serde_json::json!({
            "event": "removed",
            "name": plugin.name(),
            "identifier": plugin.identifier(),
        }),
        Notification::Renamed { plugin, old_name, new_name } => serde_json::json!({
            "event": "renamed",
            "identifier": plugin.identifier(),
            "old_name": old_name,
            "new_name": new_name,
        }),
        Notification::LoadFailed { bundle, reason } => serde_json::json!({
            "event": "load_failed",
            "path": bundle.display().to_string(),
            "error": reason,
        }),
    }
}

fn report(output: &Output, notifications: Vec<Notification>) {
    for notification in &notifications {
        if output.is_json() {
            output.data(&to_json(notification));
        } else {
            println!("{}", describe(notification));
        }
    }
}

pub fn run(output: &Output) -> Result<()> {
    let library = Library::open_current()?;
    let mut controller = library.controller(RecordingDelegate::new())?;

    let initial = controller.delegate_mut().take();
    report(output, initial);

    if !output.is_json() {
        println!(
            "Watching {} ({} plugins). Press Ctrl+C to stop.",
            library.plugins_dir().display(),
            controller.len()
        );
    }

    watch::watch(&library, &mut controller, |controller, event, outcome| {
        output.verbose_ctx("watch", &format!("{:?} -> {:?}", event, outcome));
        report(output, controller.delegate_mut().take());
        ControlFlow::Continue(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ManifestFormat, Plugin};
    use std::path::PathBuf;

    fn plugin(name: &str) -> Plugin {
        Plugin::new("P-1", name, PathBuf::from("/lib/PlugIns/P.plugshelf"), ManifestFormat::Json)
    }

    #[test]
    fn describes_each_notification() {
        assert_eq!(describe(&Notification::Added(plugin("Print"))), "added    Print");
        assert_eq!(
            describe(&Notification::Renamed {
                plugin: plugin("Print 2"),
                old_name: "Print".to_string(),
                new_name: "Print 2".to_string(),
            }),
            "renamed  Print -> Print 2"
        );
    }

    #[test]
    fn json_events_carry_kind() {
        let value = to_json(&Notification::LoadFailed {
            bundle: PathBuf::from("/lib/PlugIns/Bad.plugshelf"),
            reason: "missing manifest".to_string(),
        });

        assert_eq!(value["event"], "load_failed");
        assert_eq!(value["error"], "missing manifest");
    }
}
