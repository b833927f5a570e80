//! Error types and Result aliases for themesync.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`.

use std::path::Path;

use thiserror::Error;

/// Result type alias using themesync's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for themesync operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Asset loading or encoding error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// File watching error.
    #[error("watcher error: {0}")]
    Watcher(#[from] WatcherError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Asset-specific errors.
#[derive(Error, Debug)]
pub enum AssetError {
    /// Root of a load or walk is not a directory.
    #[error("path is not a directory: {path}")]
    NotADirectory { path: String },

    /// Requested asset key names a directory.
    #[error("asset is a directory: {key}")]
    IsDirectory { key: String },

    /// Requested asset key does not exist.
    #[error("asset not found: {key}")]
    NotFound { key: String },

    /// Attachment is not valid base64.
    #[error("invalid attachment encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// JSON asset value could not be parsed.
    #[error("malformed content in '{key}': {source}")]
    MalformedContent {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// File watcher errors.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Failed to register a notification handle.
    #[error("failed to watch path '{path}': {reason}")]
    WatchSetup { path: String, reason: String },

    /// Event loop could not be started.
    #[error("event loop error: {0}")]
    EventLoop(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error reports a missing asset.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Asset(AssetError::NotFound { .. }))
    }

    /// Whether this error reports a directory where an asset was expected.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self, Self::Asset(AssetError::IsDirectory { .. }))
    }
}

impl AssetError {
    /// Create a not-a-directory error.
    pub fn not_a_directory(path: &Path) -> Self {
        Self::NotADirectory {
            path: path.display().to_string(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }
}

impl WatcherError {
    /// Create a watch setup error from any displayable cause.
    pub fn setup(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::WatchSetup {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
