//! Log setup for the whole process.
//!
//! One explicit `init` call owns the subscriber configuration; the rest of the
//! crate only emits `tracing` events. The log file is opened in overwrite mode
//! and captures everything from `debug` upward, independent of the console.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Initialize tracing with a file layer and an optional stderr layer.
///
/// The file at `log_path` is truncated on every run. When `verbose` is set,
/// info-level events are mirrored to stderr as well (stdout stays reserved
/// for progress text and the summary).
pub fn init(log_path: &Path, verbose: bool) -> Result<()> {
    let file = fs_err::File::create(log_path)
        .context("Failed to open log file")?;
    let (file, _path) = file.into_parts();
    let file = Arc::new(file);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        );

    let stderr_layer = if verbose {
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new("vidsum=info")),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .init();

    tracing::debug!("logging initialized, file: {}", log_path.display());
    Ok(())
}
