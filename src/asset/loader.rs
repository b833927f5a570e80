//! Directory loader: discovers project files and reads them into assets.

use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use super::Asset;
use crate::error::AssetError;
use crate::Result;

/// Convert `path` into a `/`-separated key relative to `root`.
///
/// Paths outside `root` are returned as given, with separators normalized.
#[must_use]
pub fn path_to_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Recursively list every regular file under `root`.
///
/// Symlinked directories are followed. Entries the walk cannot resolve,
/// such as dangling symlinks or symlink loops, are logged and skipped.
///
/// # Errors
///
/// Returns `AssetError::NotADirectory` if `root` is not a directory.
pub fn find_all_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(AssetError::not_a_directory(root).into());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable entry");
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Load every asset under `root/prefix` that `ignore` does not reject.
///
/// `ignore` receives each file's key relative to `root`. Loading stops at
/// the first file that fails to load.
///
/// # Errors
///
/// Returns `AssetError::NotADirectory` if `root/prefix` is not a directory,
/// or the first load error encountered.
pub fn load_assets_from_directory<F>(
    root: impl AsRef<Path>,
    prefix: &str,
    ignore: F,
) -> Result<Vec<Asset>>
where
    F: Fn(&str) -> bool,
{
    let root = root.as_ref();
    let dir = if prefix.is_empty() {
        root.to_path_buf()
    } else {
        root.join(prefix)
    };

    let mut assets = Vec::new();
    let mut skipped = 0usize;
    for path in find_all_files(&dir)? {
        let key = path_to_key(root, &path);
        if ignore(&key) {
            skipped += 1;
            continue;
        }
        assets.push(load_asset(root, &key)?);
    }

    tracing::debug!(
        root = %root.display(),
        prefix,
        loaded = assets.len(),
        skipped,
        "Loaded assets from directory"
    );

    Ok(assets)
}

/// Load the asset stored at `root/key`.
///
/// Valid UTF-8 without NUL bytes becomes a text asset; anything else is
/// stored base64-encoded as an attachment.
///
/// # Errors
///
/// Returns `AssetError::IsDirectory` if the key names a directory,
/// `AssetError::NotFound` if it does not exist, or an I/O error if the
/// file cannot be read.
pub fn load_asset(root: impl AsRef<Path>, key: &str) -> Result<Asset> {
    let path = root.as_ref().join(key);
    let key = path_to_key(root.as_ref(), &path);

    let metadata = match fs::metadata(&path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AssetError::not_found(key).into());
        }
        Err(e) => return Err(e.into()),
    };
    if metadata.is_dir() {
        return Err(AssetError::IsDirectory { key }.into());
    }

    let bytes = fs::read(&path)?;
    let asset = match String::from_utf8(bytes) {
        Ok(text) if !text.contains('\0') => Asset::text(key, text),
        Ok(text) => Asset::binary(key, text.as_bytes()),
        Err(e) => Asset::binary(key, e.as_bytes()),
    };

    Ok(asset)
}
