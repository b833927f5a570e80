//! Fixture theme project shared by unit tests.

use std::fs;

use tempfile::TempDir;

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

/// A 1x1 transparent PNG.
pub const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
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
