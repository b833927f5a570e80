//! File system watching.
//!
//! This module provides:
//! - Directory watching using notify-rs, symlink-aware
//! - Gitignore-style include/exclude filtering
//! - Per-path debouncing of change bursts
//! - Config-file watching that signals a reload

mod debouncer;
mod events;
mod filter;
mod paths;
#[allow(clippy::module_inception)]
mod watcher;

pub use debouncer::Debouncer;
pub use events::{changes, EventLedger, EventType};
pub use filter::{FilterConfig, PathFilter, DEFAULT_EXCLUDES};
pub use paths::{path_to_project, ProjectPaths};
pub use watcher::{
    Callback, FileWatcher, LocalProject, ProjectClient, WatcherConfig, DEBOUNCE_DURATION,
};
