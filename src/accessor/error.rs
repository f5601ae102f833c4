use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessorError {
    #[error("lfortran executable not found (configured: {0:?})")]
    ExecutableNotFound(Option<PathBuf>),

    #[error("Failed to prepare temporary source file: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("Failed to run {command}: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed compiler output for {capability}: {source}")]
    MalformedOutput {
        capability: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
