//! Plugin commands: list, show, duplicate, rename

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::Plugin;
use crate::registry::{Notification, RecordingDelegate};
use crate::storage::{write_manifest, DuplicatePluginController, Library};

/// JSON view of a plugin
fn plugin_json(plugin: &Plugin) -> serde_json::Value {
    serde_json::json!({
        "name": plugin.name(),
        "identifier": plugin.identifier(),
        "kind": plugin.kind().as_str(),
        "format": plugin.format().as_str(),
        "editable": plugin.editable(),
        "hidden": plugin.hidden(),
        "command": plugin.command(),
        "command_path": plugin.command_path().map(|p| p.display().to_string()),
        "suffixes": plugin.suffixes(),
        "path": plugin.bundle_path().display().to_string(),
    })
}

/// Reports load failures collected while building the registry
fn report_failures(output: &Output, delegate: &mut RecordingDelegate) -> Vec<serde_json::Value> {
    let mut failures = Vec::new();
    for notification in delegate.take() {
        if let Notification::LoadFailed { bundle, reason } = notification {
            output.warn(&reason);
            failures.push(serde_json::json!({
                "path": bundle.display().to_string(),
                "error": reason,
            }));
        }
    }
    failures
}

pub fn list(output: &Output) -> Result<()> {
    let library = Library::open_current()?;
    output.verbose_ctx("list", &format!("Scanning {}", library.plugins_dir().display()));

    let mut controller = library.controller(RecordingDelegate::new())?;
    let failures = report_failures(output, controller.delegate_mut());
    let plugins = controller.plugins();

    if output.is_json() {
        let items: Vec<_> = plugins.iter().map(plugin_json).collect();
        output.data(&serde_json::json!({
            "plugins": items,
            "errors": failures,
        }));
    } else if plugins.is_empty() {
        println!("No plugins found.");
        println!();
        println!(
            "Plugins are bundles ending in '.{}' inside {}",
            library.bundle_extension(),
            library.plugins_dir().display()
        );
    } else {
        println!("{:<30} {:<38} PATH", "NAME", "IDENTIFIER");
        println!("{}", "-".repeat(90));
        for plugin in &plugins {
            println!(
                "{:<30} {:<38} {}",
                plugin.name(),
                plugin.identifier(),
                plugin.bundle_path().display()
            );
        }
    }

    Ok(())
}

pub fn show(output: &Output, name: &str) -> Result<()> {
    let library = Library::open_current()?;
    let mut controller = library.controller(RecordingDelegate::new())?;
    report_failures(output, controller.delegate_mut());

    let plugin = controller
        .plugin_named(name)
        .ok_or_else(|| anyhow::anyhow!("Plugin not found: {}", name))?;

    if output.is_json() {
        output.data(&plugin_json(plugin));
    } else {
        println!("Name:       {}", plugin.name());
        println!("Identifier: {}", plugin.identifier());
        println!("Kind:       {}", plugin.kind().as_str());
        println!("Manifest:   {}", plugin.manifest_path().display());
        println!("Editable:   {}", plugin.editable());
        if let Some(command_path) = plugin.command_path() {
            println!("Command:    {}", command_path.display());
        }
        if !plugin.suffixes().is_empty() {
            println!("Suffixes:   {}", plugin.suffixes().join(", "));
        }
        println!("Path:       {}", plugin.bundle_path().display());
    }

    Ok(())
}

pub fn duplicate(output: &Output, name: &str) -> Result<()> {
    let library = Library::open_current()?;
    let mut controller = library.controller(RecordingDelegate::new())?;
    report_failures(output, controller.delegate_mut());

    let copy = DuplicatePluginController::for_library(&library)
        .duplicate(name, &mut controller)
        .with_context(|| format!("Failed to duplicate plugin '{}'", name))?;

    if output.is_json() {
        output.data(&plugin_json(&copy));
    } else {
        output.success(&format!("Duplicated '{}' as '{}'", name, copy.name()));
        output.verbose_ctx("duplicate", &format!("Bundle: {}", copy.bundle_path().display()));
    }

    Ok(())
}

pub fn rename(output: &Output, name: &str, new_name: &str) -> Result<()> {
    let new_name = new_name.trim();
    if new_name.is_empty() {
        anyhow::bail!("New name must not be empty");
    }

    let library = Library::open_current()?;
    let mut controller = library.controller(RecordingDelegate::new())?;
    report_failures(output, controller.delegate_mut());

    let plugin = controller
        .plugin_named(name)
        .ok_or_else(|| anyhow::anyhow!("Plugin not found: {}", name))?;
    if !plugin.editable() {
        anyhow::bail!("Plugin '{}' is not editable", name);
    }

    let resolved = controller
        .rename(name, new_name)
        .ok_or_else(|| anyhow::anyhow!("Plugin not found: {}", name))?;
    let renamed = controller
        .plugin_named(&resolved)
        .ok_or_else(|| anyhow::anyhow!("Plugin not found: {}", resolved))?;
    write_manifest(renamed)
        .with_context(|| format!("Failed to save plugin '{}'", resolved))?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "old_name": name,
            "requested": new_name,
            "name": resolved,
            "identifier": renamed.identifier(),
        }));
    } else if resolved != new_name {
        output.success(&format!(
            "Renamed '{}' to '{}' ('{}' is taken)",
            name, resolved, new_name
        ));
    } else {
        output.success(&format!("Renamed '{}' to '{}'", name, resolved));
    }

    Ok(())
}
