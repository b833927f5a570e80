//! themesync
//!
//! Keeps a local theme directory in sync by loading its assets and
//! watching it for changes, handing each change to an uploader callback.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod asset;
pub mod config;
pub mod error;
pub mod observability;
pub mod watcher;

#[cfg(test)]
mod test_support;

pub use asset::Asset;
pub use config::Config;
pub use error::{Error, Result};
pub use watcher::{EventType, FileWatcher, PathFilter, WatcherConfig};
