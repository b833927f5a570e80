//! themesync - keep a theme directory in sync
//!
//! Entry point for the `themesync` watcher.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use themesync::asset::load_assets_from_directory;
use themesync::observability::init_tracing;
use themesync::watcher::{EventType, FileWatcher, LocalProject, ProjectClient};
use themesync::{Asset, Config};

/// themesync - watch a theme directory and hand changes to an uploader
#[derive(Parser, Debug)]
#[command(name = "themesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Theme project directory
    #[arg(short, long, env = "THEMESYNC_DIRECTORY", default_value = ".")]
    directory: PathBuf,

    /// Configuration file; writing to it restarts the watcher
    #[arg(short, long, env = "THEMESYNC_CONFIG")]
    config: Option<PathBuf>,

    /// File to touch once the first change has been handed off
    #[arg(long, env = "THEMESYNC_NOTIFY")]
    notify: Option<PathBuf>,

    /// Only sync paths matching these patterns
    #[arg(long, env = "THEMESYNC_INCLUDE", value_delimiter = ',')]
    include: Vec<String>,

    /// Never sync paths matching these patterns
    #[arg(long, env = "THEMESYNC_EXCLUDE", value_delimiter = ',')]
    exclude: Vec<String>,

    /// Files with additional exclude patterns (gitignore syntax)
    #[arg(long = "ignore-file", env = "THEMESYNC_IGNORE_FILES", value_delimiter = ',')]
    ignore_files: Vec<PathBuf>,

    /// Do not exclude VCS directories and editor files by default
    #[arg(long)]
    no_default_excludes: bool,

    /// Quiet period in milliseconds before a change is dispatched
    #[arg(long, env = "THEMESYNC_DEBOUNCE_MS", default_value = "500")]
    debounce_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "THEMESYNC_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "THEMESYNC_LOG_JSON")]
    log_json: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            directory: cli.directory,
            config_file: cli.config,
            notify_file: cli.notify,
            include: cli.include,
            exclude: cli.exclude,
            ignore_files: cli.ignore_files,
            default_excludes: !cli.no_default_excludes,
            debounce_ms: cli.debounce_ms,
            log_level: cli.log_level,
            log_json: cli.log_json,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let config = Config::from(Cli::parse());

    init_tracing(&config.log_level, config.log_json);

    tracing::info!("themesync v{} starting...", env!("CARGO_PKG_VERSION"));
    tracing::debug!(?config, "Configuration loaded");

    config.validate()?;

    loop {
        let filter = config.filter()?;

        let assets = load_assets_from_directory(&config.directory, "", |key| filter.ignore(key))
            .with_context(|| format!("failed to load {}", config.directory.display()))?;
        let total: usize = assets.iter().map(Asset::size).sum();
        tracing::info!(assets = assets.len(), bytes = total, "Loaded project");

        let watcher = FileWatcher::new(
            LocalProject::new(&config.directory),
            &config.watcher_config(),
            filter,
            hand_off,
        )?;

        let (reload_tx, reload_rx) = crossbeam_channel::bounded(1);
        if let Some(path) = &config.config_file {
            watcher
                .watch_config(path, reload_tx)
                .with_context(|| format!("failed to watch config {}", path.display()))?;
        }

        watcher.join();

        if reload_rx.try_recv().is_err() {
            break;
        }
        tracing::info!("Restarting watcher");
    }

    Ok(())
}

/// Hand a debounced change to the uploader.
fn hand_off(project: &LocalProject, asset: Asset, event: EventType) {
    match event {
        EventType::Update => match asset.contents() {
            Ok(bytes) => tracing::info!(
                project = %project.directory().display(),
                key = %asset.key,
                bytes = bytes.len(),
                "Asset updated"
            ),
            Err(e) => tracing::warn!(key = %asset.key, error = %e, "Asset has invalid content"),
        },
        EventType::Remove => tracing::info!(
            project = %project.directory().display(),
            key = %asset.key,
            "Asset removed"
        ),
    }
}
