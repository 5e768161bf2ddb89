//! Tracing setup: stdout always, plus a plain-text file when `LOG_FILE` is set.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_FILTER: &str = "info,chatgraph=debug,chatgraph_server=debug";

/// Opens `path` for appending, creating it when missing.
fn open_log_file(path: impl AsRef<Path>) -> std::io::Result<Mutex<File>> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Mutex::new(file))
}

/// Initializes tracing. `RUST_LOG` overrides the default `info,chatgraph=debug,chatgraph_server=debug`.
pub fn init_tracing() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(filter.clone());
    let registry = tracing_subscriber::registry().with(stdout_layer);

    match std::env::var("LOG_FILE") {
        Ok(path) if !path.trim().is_empty() => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(open_log_file(&path)?)
                .with_ansi(false)
                .with_target(true)
                .with_filter(filter);
            registry.with(file_layer).try_init()?;
            tracing::info!(path = %path, "logging to file");
        }
        _ => registry.try_init()?,
    }
    Ok(())
}
