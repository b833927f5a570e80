//! Shared fixture for integration tests.

#![allow(dead_code)]

use std::fs;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};
use tempfile::TempDir;
use themesync::watcher::{Callback, LocalProject};
use themesync::{Asset, EventType};

/// Files written by `generate_project`, relative to the project root.
pub const PROJECT_FILES: &[&str] = &[
    "assets/application.js",
    "assets/pixel.png",
    "config/settings_data.json",
    "layout/theme.liquid",
    "locales/en.default.json",
    "snippets/snippet.liquid",
    "templates/customers/test.liquid",
    "templates/template.liquid",
];

/// Generous upper bound for a real filesystem event to be dispatched.
pub const DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);

const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89,
];

/// Create a theme project in a fresh temporary directory.
pub fn generate_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    for file in PROJECT_FILES {
        let path = tmp.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        match *file {
            "assets/application.js" => fs::write(&path, "this is js content").unwrap(),
            "assets/pixel.png" => fs::write(&path, PIXEL_PNG).unwrap(),
            f if f.ends_with(".json") => fs::write(&path, "{\"name\":\"theme\"}").unwrap(),
            _ => fs::write(&path, format!("content of {file}")).unwrap(),
        }
    }
    tmp
}

/// A callback that forwards every dispatch to a channel.
pub fn recording_callback() -> (Callback<LocalProject>, Receiver<(Asset, EventType)>) {
    let (tx, rx) = unbounded();
    let callback: Callback<LocalProject> = Box::new(move |_project, asset, event| {
        let _ = tx.send((asset, event));
    });
    (callback, rx)
}

/// Wait for the first dispatch concerning `key`.
pub fn wait_for_key(rx: &Receiver<(Asset, EventType)>, key: &str) -> (Asset, EventType) {
    loop {
        let (asset, event) = rx
            .recv_timeout(DISPATCH_TIMEOUT)
            .unwrap_or_else(|_| panic!("no dispatch for {key}"));
        if asset.key == key {
            return (asset, event);
        }
    }
}
