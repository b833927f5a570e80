//! Theme assets and the directory loader.
//!
//! This module provides:
//! - The `Asset` value type (text or base64 attachment)
//! - Recursive file discovery under a project root
//! - Loading assets from disk with text/binary classification

#[allow(clippy::module_inception)]
mod asset;
mod loader;

pub use asset::Asset;
pub use loader::{find_all_files, load_asset, load_assets_from_directory, path_to_key};
