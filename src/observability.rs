//! Structured logging configuration.
//!
//! Sets up the `tracing` subscriber with a configurable level and either
//! plain-text or JSON output.

use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Registry,
};

/// Build the level filter, letting `RUST_LOG` override `level`.
#[must_use]
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize tracing with the given level and output format.
///
/// # Panics
///
/// Panics if a tracing subscriber has already been initialized in this process.
pub fn init_tracing(level: &str, json: bool) {
    let env_filter = env_filter(level);

    if json {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_thread_names(true);

        Registry::default().with(env_filter).with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer().with_target(false).with_thread_names(true);

        Registry::default().with(env_filter).with(fmt_layer).init();
    }

    tracing::debug!("Tracing initialized: level={}, json={}", level, json);
}
