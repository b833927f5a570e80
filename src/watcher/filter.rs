//! Include/exclude path filtering with gitignore-style globs.

use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::{Error, Result};

/// Patterns for files that never belong to a theme.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git/",
    ".hg/",
    ".bzr/",
    ".svn/",
    "_darcs/",
    "CVS/",
    ".sass-cache/",
    "*.sublime-project",
    "*.sublime-workspace",
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    "config.yml",
    "*.swp",
    "*~",
];

/// Sources of patterns for a [`PathFilter`].
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// When non-empty, only paths matching one of these are kept.
    pub include: Vec<String>,
    /// Paths matching any of these are ignored.
    pub exclude: Vec<String>,
    /// Files with one exclude pattern per line, gitignore syntax.
    pub ignore_files: Vec<PathBuf>,
    /// Also exclude [`DEFAULT_EXCLUDES`].
    pub default_excludes: bool,
}

/// Decides which project paths are ignored.
///
/// An exclude match always wins over an include match. A filter with no
/// patterns ignores nothing.
#[derive(Debug, Clone)]
pub struct PathFilter {
    root: PathBuf,
    include: Option<Gitignore>,
    exclude: Option<Gitignore>,
}

impl PathFilter {
    /// A filter that ignores nothing.
    pub fn allow_all(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            include: None,
            exclude: None,
        }
    }

    /// Build a filter from include and exclude pattern lists.
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern is invalid.
    pub fn new(root: impl AsRef<Path>, include: &[&str], exclude: &[&str]) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        Ok(Self {
            include: build_matcher(&root, include, &[])?,
            exclude: build_matcher(&root, exclude, &[])?,
            root,
        })
    }

    /// Build a filter from a [`FilterConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern is invalid or an ignore file cannot be read.
    pub fn from_config(root: impl AsRef<Path>, config: &FilterConfig) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        let mut exclude: Vec<&str> = config.exclude.iter().map(String::as_str).collect();
        if config.default_excludes {
            exclude.extend_from_slice(DEFAULT_EXCLUDES);
        }
        let include: Vec<&str> = config.include.iter().map(String::as_str).collect();

        Ok(Self {
            include: build_matcher(&root, &include, &[])?,
            exclude: build_matcher(&root, &exclude, &config.ignore_files)?,
            root,
        })
    }

    /// The project root patterns are relative to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check whether a file at `path` should be ignored.
    ///
    /// `path` may be a project key or an absolute path under the root.
    #[must_use]
    pub fn ignore(&self, path: impl AsRef<Path>) -> bool {
        let Some(relative) = self.relative(path.as_ref()) else {
            return false;
        };
        let is_dir = self.root.join(relative).is_dir();

        if self.is_excluded(relative, is_dir) {
            return true;
        }

        self.include.as_ref().is_some_and(|include| {
            !include
                .matched_path_or_any_parents(relative, is_dir)
                .is_ignore()
        })
    }

    /// Check whether a directory's whole subtree is excluded.
    ///
    /// Include patterns never prune directories.
    #[must_use]
    pub fn ignore_dir(&self, path: impl AsRef<Path>) -> bool {
        self.relative(path.as_ref())
            .is_some_and(|relative| self.is_excluded(relative, true))
    }

    fn is_excluded(&self, relative: &Path, is_dir: bool) -> bool {
        self.exclude.as_ref().is_some_and(|exclude| {
            exclude
                .matched_path_or_any_parents(relative, is_dir)
                .is_ignore()
        })
    }

    /// Strip the root from absolute paths; `None` for paths outside it.
    fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        if path.is_absolute() {
            path.strip_prefix(&self.root).ok()
        } else {
            Some(path)
        }
    }
}

fn build_matcher(root: &Path, patterns: &[&str], files: &[PathBuf]) -> Result<Option<Gitignore>> {
    if patterns.is_empty() && files.is_empty() {
        return Ok(None);
    }

    let mut builder = GitignoreBuilder::new(root);
    for pattern in patterns {
        builder
            .add_line(None, pattern)
            .map_err(|e| Error::config(format!("invalid pattern '{pattern}': {e}")))?;
    }
    for file in files {
        if let Some(e) = builder.add(file) {
            return Err(Error::config(format!(
                "failed to read ignore file '{}': {e}",
                file.display()
            )));
        }
    }

    let matcher = builder
        .build()
        .map_err(|e| Error::config(format!("failed to build path filter: {e}")))?;
    Ok(Some(matcher))
}
