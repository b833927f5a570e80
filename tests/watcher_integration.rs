//! Integration tests for the file watcher against a real filesystem.

mod common;

use std::fs;
use std::time::Duration;

use common::{generate_project, recording_callback, wait_for_key, DISPATCH_TIMEOUT, PROJECT_FILES};
use crossbeam_channel::bounded;
use themesync::asset::load_assets_from_directory;
use themesync::watcher::{FilterConfig, LocalProject};
use themesync::{EventType, FileWatcher, PathFilter, WatcherConfig};

fn fast_config() -> WatcherConfig {
    WatcherConfig {
        debounce: Duration::from_millis(100),
        notify_file: None,
    }
}

#[test]
fn test_load_generated_project() {
    let project = generate_project();
    let filter = PathFilter::from_config(project.path(), &FilterConfig::default()).unwrap();

    let assets = load_assets_from_directory(project.path(), "", |key| filter.ignore(key)).unwrap();

    let keys: Vec<&str> = assets.iter().map(|a| a.key.as_str()).collect();
    assert_eq!(keys, PROJECT_FILES);

    let pixel = assets.iter().find(|a| a.key == "assets/pixel.png").unwrap();
    assert!(pixel.value.is_empty());
    assert!(!pixel.attachment.is_empty());
}

#[test]
fn test_load_with_prefix_and_exclude() {
    let project = generate_project();
    let filter = PathFilter::new(project.path(), &[], &["*.liquid"]).unwrap();

    let assets =
        load_assets_from_directory(project.path(), "assets", |key| filter.ignore(key)).unwrap();

    assert_eq!(assets.len(), 2);
    assert!(assets.iter().all(|a| a.key.starts_with("assets/")));
}

#[test]
fn test_write_dispatches_update() {
    let project = generate_project();
    let (callback, rx) = recording_callback();
    let watcher = FileWatcher::new(
        LocalProject::new(project.path()),
        &fast_config(),
        PathFilter::allow_all(project.path()),
        callback,
    )
    .unwrap();

    fs::write(project.path().join("templates/template.liquid"), "new content").unwrap();

    let (asset, event) = wait_for_key(&rx, "templates/template.liquid");
    assert_eq!(event, EventType::Update);
    assert_eq!(asset.value, "new content");

    watcher.stop_watching();
    watcher.join();
}

#[test]
fn test_new_file_in_nested_directory() {
    let project = generate_project();
    let (callback, rx) = recording_callback();
    let _watcher = FileWatcher::new(
        LocalProject::new(project.path()),
        &fast_config(),
        PathFilter::allow_all(project.path()),
        callback,
    )
    .unwrap();

    fs::write(project.path().join("templates/customers/login.liquid"), "login").unwrap();

    let (asset, event) = wait_for_key(&rx, "templates/customers/login.liquid");
    assert_eq!(event, EventType::Update);
    assert_eq!(asset.value, "login");
}

#[test]
fn test_delete_dispatches_remove() {
    let project = generate_project();
    let (callback, rx) = recording_callback();
    let _watcher = FileWatcher::new(
        LocalProject::new(project.path()),
        &fast_config(),
        PathFilter::allow_all(project.path()),
        callback,
    )
    .unwrap();

    fs::remove_file(project.path().join("assets/application.js")).unwrap();

    let (asset, event) = wait_for_key(&rx, "assets/application.js");
    assert_eq!(event, EventType::Remove);
    assert!(asset.value.is_empty());
    assert!(asset.attachment.is_empty());
}

#[test]
fn test_excluded_paths_are_not_dispatched() {
    let project = generate_project();
    let (callback, rx) = recording_callback();
    let filter = PathFilter::new(project.path(), &[], &["*.png"]).unwrap();
    let _watcher =
        FileWatcher::new(LocalProject::new(project.path()), &fast_config(), filter, callback)
            .unwrap();

    fs::write(project.path().join("assets/pixel.png"), b"\x89PNG").unwrap();
    fs::write(project.path().join("assets/application.js"), "changed").unwrap();

    let (asset, _) = rx.recv_timeout(DISPATCH_TIMEOUT).unwrap();
    assert_eq!(asset.key, "assets/application.js");
    assert!(rx.recv_timeout(Duration::from_millis(500)).is_err());
}

#[test]
fn test_notify_file_touched_after_dispatch() {
    let project = generate_project();
    let sentinel_dir = tempfile::TempDir::new().unwrap();
    let notify = sentinel_dir.path().join("notify");

    let (callback, rx) = recording_callback();
    let config = WatcherConfig {
        notify_file: Some(notify.clone()),
        ..fast_config()
    };
    let _watcher = FileWatcher::new(
        LocalProject::new(project.path()),
        &config,
        PathFilter::allow_all(project.path()),
        callback,
    )
    .unwrap();

    fs::write(project.path().join("layout/theme.liquid"), "layout").unwrap();
    wait_for_key(&rx, "layout/theme.liquid");

    assert!(notify.exists());
}

#[test]
fn test_config_write_reloads_and_stops() {
    let project = generate_project();
    let config_file = project.path().join("config.yml");
    fs::write(&config_file, "development:\n  store: example\n").unwrap();

    let (callback, _rx) = recording_callback();
    let filter = PathFilter::new(project.path(), &[], &["config.yml"]).unwrap();
    let watcher =
        FileWatcher::new(LocalProject::new(project.path()), &fast_config(), filter, callback)
            .unwrap();

    let (reload_tx, reload_rx) = bounded(1);
    watcher.watch_config(&config_file, reload_tx).unwrap();

    fs::write(&config_file, "development:\n  store: changed\n").unwrap();

    reload_rx.recv_timeout(DISPATCH_TIMEOUT).unwrap();
    watcher.join();
    assert!(!watcher.is_watching());
}

#[test]
fn test_watch_config_missing_file() {
    let project = generate_project();
    let (callback, _rx) = recording_callback();
    let watcher = FileWatcher::new(
        LocalProject::new(project.path()),
        &fast_config(),
        PathFilter::allow_all(project.path()),
        callback,
    )
    .unwrap();

    let (reload_tx, _reload_rx) = bounded(1);
    assert!(watcher
        .watch_config(project.path().join("missing.yml"), reload_tx)
        .is_err());
}

#[cfg(unix)]
#[test]
fn test_symlinked_directory_uses_logical_key() {
    let project = generate_project();
    let external = tempfile::TempDir::new().unwrap();
    fs::write(external.path().join("shared.liquid"), "shared").unwrap();
    std::os::unix::fs::symlink(external.path(), project.path().join("sections")).unwrap();

    let (callback, rx) = recording_callback();
    let _watcher = FileWatcher::new(
        LocalProject::new(project.path()),
        &fast_config(),
        PathFilter::allow_all(project.path()),
        callback,
    )
    .unwrap();

    fs::write(external.path().join("shared.liquid"), "updated").unwrap();

    let (asset, event) = wait_for_key(&rx, "sections/shared.liquid");
    assert_eq!(event, EventType::Update);
    assert_eq!(asset.value, "updated");
}
