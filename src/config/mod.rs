//! Configuration management for themesync.
//!
//! Supports configuration from:
//! - Command-line arguments (highest priority)
//! - Environment variables
//! - Defaults

mod settings;

pub use settings::Config;
