//! Mapping notification paths back to project keys.
//!
//! Directories are registered by their canonical location, so events for a
//! symlinked subdirectory arrive under the link target. `ProjectPaths`
//! remembers each target and the logical path it was reached through.

use std::path::{Path, PathBuf};

use crate::asset::path_to_key;

/// Project-relative key for `path`.
#[must_use]
pub fn path_to_project(root: &Path, path: &Path) -> String {
    path_to_key(root, path)
}

/// Project root plus the real locations its directories resolve to.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
    /// (real, logical) pairs, deepest real path first.
    aliases: Vec<(PathBuf, PathBuf)>,
}

impl ProjectPaths {
    /// Create a mapping with no aliases.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            aliases: Vec::new(),
        }
    }

    /// The project root as configured.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remember that `real` is reached through `logical`.
    pub fn add_alias(&mut self, real: PathBuf, logical: PathBuf) {
        if real == logical || self.aliases.iter().any(|(r, _)| *r == real) {
            return;
        }
        self.aliases.push((real, logical));
        self.aliases
            .sort_by_key(|(real, _)| std::cmp::Reverse(real.components().count()));
    }

    /// Number of registered aliases.
    #[must_use]
    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    /// Absolute path of `path` as seen through the project root.
    #[must_use]
    pub fn logical_path(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            return self.root.join(path);
        }
        if path.starts_with(&self.root) {
            return path.to_path_buf();
        }
        self.aliases
            .iter()
            .find_map(|(real, logical)| path.strip_prefix(real).ok().map(|rest| logical.join(rest)))
            .unwrap_or_else(|| path.to_path_buf())
    }

    /// Project key for a notification path.
    #[must_use]
    pub fn key_for(&self, path: &Path) -> String {
        path_to_project(&self.root, &self.logical_path(path))
    }
}
