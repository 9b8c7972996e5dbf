//! Lifecycle tests against real bundles on disk
//!
//! These run the controller with the manifest loader over temporary
//! libraries, the way the watcher and the CLI drive it.

use std::fs;
use std::path::{Path, PathBuf};

use plugshelf::domain::{ManifestFormat, Plugin};
use plugshelf::registry::{
    duplicate_path, unique_name, BundleEvent, EventOutcome, KeyedRegistry, Notification,
    RecordingDelegate,
};
use plugshelf::storage::{DuplicatePluginController, Library};
use tempfile::TempDir;

fn write_json_bundle(plugins_dir: &Path, dir_name: &str, name: &str, identifier: &str) -> PathBuf {
    let bundle = plugins_dir.join(dir_name);
    fs::create_dir_all(&bundle).unwrap();
    fs::write(
        bundle.join("plugin.json"),
        format!(r#"{{"name":"{}","identifier":"{}"}}"#, name, identifier),
    )
    .unwrap();
    bundle
}

fn write_toml_bundle(plugins_dir: &Path, dir_name: &str, name: &str, identifier: &str) -> PathBuf {
    let bundle = plugins_dir.join(dir_name);
    fs::create_dir_all(&bundle).unwrap();
    fs::write(
        bundle.join("plugin.toml"),
        format!("name = \"{}\"\nidentifier = \"{}\"\n", name, identifier),
    )
    .unwrap();
    bundle
}

fn library() -> (TempDir, Library) {
    let dir = TempDir::new().unwrap();
    let library = Library::init(dir.path()).unwrap();
    (dir, library)
}

#[test]
fn appeared_bundles_get_unique_names() {
    let (_dir, library) = library();
    let plugins_dir = library.plugins_dir();
    let mut controller = library.controller(RecordingDelegate::new()).unwrap();

    let first = write_json_bundle(&plugins_dir, "One.plugshelf", "Print", "ONE");
    let second = write_toml_bundle(&plugins_dir, "Two.plugshelf", "Print", "TWO");
    let third = write_json_bundle(&plugins_dir, "Three.plugshelf", "Print", "THREE");

    assert_eq!(
        controller.handle(BundleEvent::Appeared(first)),
        EventOutcome::Added("Print".to_string())
    );
    assert_eq!(
        controller.handle(BundleEvent::Appeared(second)),
        EventOutcome::Added("Print 2".to_string())
    );
    assert_eq!(
        controller.handle(BundleEvent::Appeared(third)),
        EventOutcome::Added("Print 3".to_string())
    );

    let toml = controller.plugin_named("Print 2").unwrap();
    assert_eq!(toml.format(), ManifestFormat::Toml);
    assert_eq!(controller.delegate().notifications().len(), 3);
}

#[test]
fn self_duplicate_does_not_grow_registry() {
    let (_dir, library) = library();
    let plugins_dir = library.plugins_dir();
    write_json_bundle(&plugins_dir, "Print.plugshelf", "Print", "ABCD-1234");
    let mut controller = library.controller(RecordingDelegate::new()).unwrap();
    assert_eq!(controller.len(), 1);

    let staged = write_json_bundle(&plugins_dir, "ABCD-1234.plugshelf", "Print", "ABCD-1234");

    assert_eq!(controller.handle(BundleEvent::Appeared(staged)), EventOutcome::Suppressed);
    assert_eq!(controller.len(), 1);
    assert!(controller.delegate().notifications().is_empty());
}

#[test]
fn leftover_copy_on_disk_is_skipped_at_load() {
    let (_dir, library) = library();
    let plugins_dir = library.plugins_dir();
    let source = write_json_bundle(&plugins_dir, "Print.plugshelf", "Print", "ABCD-1234");
    write_json_bundle(&plugins_dir, "ABCD-1234.plugshelf", "Print", "ABCD-1234");

    let controller = library.controller(RecordingDelegate::new()).unwrap();

    assert_eq!(controller.len(), 1);
    let print = controller.plugin_named("Print").unwrap();
    assert_eq!(print.bundle_path(), source.as_path());
    assert!(controller.plugin_named("Print 2").is_none());
    assert!(controller.delegate().notifications().is_empty());
}

#[test]
fn bundle_at_own_identifier_path_is_not_a_duplicate() {
    let (_dir, library) = library();
    let plugins_dir = library.plugins_dir();
    let bundle = write_json_bundle(&plugins_dir, "ABCD-1234.plugshelf", "Print", "ABCD-1234");

    let controller = library.controller(RecordingDelegate::new()).unwrap();

    assert_eq!(controller.len(), 1);
    assert!(!controller.is_self_duplicate(&bundle));
}

#[test]
fn removing_unknown_bundle_is_silent() {
    let (_dir, library) = library();
    let plugins_dir = library.plugins_dir();
    write_json_bundle(&plugins_dir, "Print.plugshelf", "Print", "P-1");
    let mut controller = library.controller(RecordingDelegate::new()).unwrap();
    let before: Vec<String> = controller.plugins().iter().map(|p| p.name().to_string()).collect();

    let outcome = controller.handle(BundleEvent::Removed(plugins_dir.join("Ghost.plugshelf")));

    assert_eq!(outcome, EventOutcome::Ignored);
    assert!(controller.delegate().notifications().is_empty());
    let after: Vec<String> = controller.plugins().iter().map(|p| p.name().to_string()).collect();
    assert_eq!(before, after);
}

#[test]
fn removal_frees_the_name() {
    let (_dir, library) = library();
    let plugins_dir = library.plugins_dir();
    let first = write_json_bundle(&plugins_dir, "A.plugshelf", "Print", "A-1");
    write_json_bundle(&plugins_dir, "B.plugshelf", "Print", "B-1");
    let mut controller = library.controller(RecordingDelegate::new()).unwrap();

    fs::remove_dir_all(&first).unwrap();
    assert_eq!(
        controller.handle(BundleEvent::Removed(first)),
        EventOutcome::Removed("Print".to_string())
    );

    let fresh = write_json_bundle(&plugins_dir, "C.plugshelf", "Print", "C-1");
    assert_eq!(
        controller.handle(BundleEvent::Appeared(fresh)),
        EventOutcome::Added("Print".to_string())
    );
}

#[test]
fn manifest_edit_renames_and_reports_disambiguation() {
    let (_dir, library) = library();
    let plugins_dir = library.plugins_dir();
    write_json_bundle(&plugins_dir, "Cat.plugshelf", "Cat", "C-1");
    let print = write_json_bundle(&plugins_dir, "Print.plugshelf", "Print", "P-1");
    let mut controller = library.controller(RecordingDelegate::new()).unwrap();

    // Print's manifest now asks for the name Cat already holds
    write_json_bundle(&plugins_dir, "Print.plugshelf", "Cat", "P-1");
    let outcome = controller.handle(BundleEvent::Modified(print.clone()));

    assert_eq!(outcome, EventOutcome::Updated("Cat 2".to_string()));
    assert_eq!(controller.plugin_at(&print).unwrap().name(), "Cat 2");
    assert!(controller.plugin_named("Print").is_none());
    match controller.delegate().notifications() {
        [Notification::Renamed { old_name, new_name, .. }] => {
            assert_eq!(old_name, "Cat");
            assert_eq!(new_name, "Cat 2");
        }
        other => panic!("unexpected notifications: {:?}", other),
    }
}

#[test]
fn broken_manifest_is_reported_and_skipped() {
    let (_dir, library) = library();
    let plugins_dir = library.plugins_dir();
    let bundle = plugins_dir.join("Broken.plugshelf");
    fs::create_dir_all(&bundle).unwrap();
    fs::write(bundle.join("plugin.json"), "{ not json").unwrap();

    let mut controller = library.controller(RecordingDelegate::new()).unwrap();
    assert!(controller.is_empty());

    let failures = controller.delegate_mut().take();
    assert!(matches!(
        failures.as_slice(),
        [Notification::LoadFailed { bundle: failed, .. }] if failed == &bundle
    ));
}

#[test]
fn identifier_fallback_after_exhausted_suffixes() {
    let plugin = Plugin::new(
        "ABCD-1234",
        "Print",
        PathBuf::from("/library/PlugIns/Print.plugshelf"),
        ManifestFormat::Json,
    );
    let mut registry = KeyedRegistry::new();

    for attempt in 0..99 {
        let name = unique_name("Print", &plugin, &registry);
        let expected = if attempt == 0 {
            "Print".to_string()
        } else {
            format!("Print {}", attempt + 1)
        };
        assert_eq!(name, expected);

        let blocker = Plugin::new(
            format!("BLOCK-{}", attempt),
            name.as_str(),
            PathBuf::from(format!("/library/PlugIns/Block{}.plugshelf", attempt)),
            ManifestFormat::Json,
        );
        registry.insert(blocker, name);
    }

    assert_eq!(unique_name("Print", &plugin, &registry), "ABCD-1234");
}

#[test]
fn duplicate_registers_an_independent_copy() {
    let (_dir, library) = library();
    let plugins_dir = library.plugins_dir();
    let source = write_json_bundle(&plugins_dir, "Print.plugshelf", "Print", "P-1");
    fs::create_dir_all(source.join("Resources")).unwrap();
    fs::write(source.join("Resources").join("template.txt"), "hello").unwrap();
    let mut controller = library.controller(RecordingDelegate::new()).unwrap();

    let copy = DuplicatePluginController::for_library(&library)
        .duplicate("Print", &mut controller)
        .unwrap();

    assert_eq!(copy.name(), "Print 2");
    assert_ne!(copy.identifier(), "P-1");
    assert!(copy.editable());
    assert_eq!(
        copy.bundle_path(),
        duplicate_path(&plugins_dir, copy.identifier(), "plugshelf").as_path()
    );
    assert!(copy.bundle_path().join("Resources").join("template.txt").is_file());
    assert!(!duplicate_path(&plugins_dir, "P-1", "plugshelf").exists());
    assert_eq!(controller.len(), 2);

    // A fresh scan sees the same two plugins
    let reloaded = library.controller(RecordingDelegate::new()).unwrap();
    let mut names: Vec<String> = reloaded.plugins().iter().map(|p| p.name().to_string()).collect();
    names.sort();
    assert_eq!(names, vec!["Print", "Print 2"]);
}

#[test]
fn duplicate_events_from_the_watcher_are_harmless() {
    let (_dir, library) = library();
    let plugins_dir = library.plugins_dir();
    write_json_bundle(&plugins_dir, "Print.plugshelf", "Print", "P-1");
    let mut controller = library.controller(RecordingDelegate::new()).unwrap();

    let copy = DuplicatePluginController::for_library(&library)
        .duplicate("Print", &mut controller)
        .unwrap();
    controller.delegate_mut().take();

    // What the watcher reports after the staged copy is moved into place
    let staging = duplicate_path(&plugins_dir, "P-1", "plugshelf");
    assert_eq!(controller.handle(BundleEvent::Removed(staging)), EventOutcome::Ignored);
    assert_eq!(
        controller.handle(BundleEvent::Appeared(copy.bundle_path().to_path_buf())),
        EventOutcome::Ignored
    );

    assert_eq!(controller.len(), 2);
    assert!(controller.delegate().notifications().is_empty());
}
