//! Configuration settings and validation.

use std::path::PathBuf;
use std::time::Duration;

use crate::watcher::{FilterConfig, PathFilter, WatcherConfig, DEBOUNCE_DURATION};
use crate::{Error, Result};

/// Longest accepted debounce window.
const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Main configuration for a sync session.
#[derive(Debug, Clone)]
pub struct Config {
    /// Theme project directory.
    pub directory: PathBuf,

    /// Configuration file whose modification triggers a reload.
    pub config_file: Option<PathBuf>,

    /// Sentinel file touched after the first change is dispatched.
    pub notify_file: Option<PathBuf>,

    /// Only sync paths matching one of these patterns.
    pub include: Vec<String>,

    /// Never sync paths matching these patterns.
    pub exclude: Vec<String>,

    /// Files containing additional exclude patterns.
    pub ignore_files: Vec<PathBuf>,

    /// Exclude VCS directories and editor files.
    pub default_excludes: bool,

    /// Quiet period before a changed file is dispatched.
    pub debounce_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON.
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            config_file: None,
            notify_file: None,
            include: Vec::new(),
            exclude: Vec::new(),
            ignore_files: Vec::new(),
            default_excludes: true,
            debounce_ms: u64::try_from(DEBOUNCE_DURATION.as_millis()).unwrap_or(500),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    /// Create a new configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.directory.as_os_str().is_empty() {
            return Err(Error::config("directory cannot be empty"));
        }

        if self.debounce_ms == 0 {
            return Err(Error::config("debounce_ms cannot be 0"));
        }

        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(Error::config(format!(
                "debounce_ms cannot exceed {MAX_DEBOUNCE_MS}"
            )));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Pattern sources for the path filter.
    #[must_use]
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            ignore_files: self.ignore_files.clone(),
            default_excludes: self.default_excludes,
        }
    }

    /// Build the path filter for the project directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is invalid or an ignore file is unreadable.
    pub fn filter(&self) -> Result<PathFilter> {
        PathFilter::from_config(&self.directory, &self.filter_config())
    }

    /// Settings for the file watcher.
    #[must_use]
    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            debounce: Duration::from_millis(self.debounce_ms),
            notify_file: self.notify_file.clone(),
        }
    }
}
