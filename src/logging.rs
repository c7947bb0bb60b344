//! Tracing setup.
//!
//! The level comes from `RUST_LOG` (default `info`). The interactive dashboard
//! owns the terminal, so it logs to a file without colours; the text commands
//! log to stderr so stdout stays clean for tables and plots.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::AppError;

fn env_filter() -> EnvFilter {
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    EnvFilter::new(level)
}

/// Log to stderr.
pub fn init_stderr() {
    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Log to `path`, appending.
pub fn init_file(path: &Path) -> Result<(), AppError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::input(format!("Cannot open log file '{}': {e}", path.display())))?;

    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(Arc::new(file)).with_ansi(false))
        .try_init();
    Ok(())
}
