use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::JsonFields;
use tracing_subscriber::prelude::*;

use crate::config;

/// Where log records are written. Never stdout, which carries the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// JSON lines appended to a file
    File(PathBuf),
    /// Human-readable lines on stderr
    Stderr,
}

impl Default for LogSink {
    fn default() -> Self {
        Self::File(config::log_path())
    }
}

pub fn init(sink: LogSink) -> anyhow::Result<()> {
    let (json_layer, stderr_layer) = match sink {
        LogSink::File(log_path) => {
            if let Some(parent) = log_path.parent() {
                std::fs::create_dir_all(parent).inspect_err(|e| {
                    eprintln!("Failed to create log directory {:?}: {}", parent, e);
                })?;
            }

            let log_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .inspect_err(|e| {
                    eprintln!("Failed to open log file {:?}: {}", log_path, e);
                })?;

            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(log_file)
                .fmt_fields(JsonFields::default());
            (Some(layer), None)
        }
        LogSink::Stderr => {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false);
            (None, Some(layer))
        }
    };

    // Use RUST_LOG if set, otherwise default to INFO
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(())
}
