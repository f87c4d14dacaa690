//! CLI error types

use std::path::PathBuf;
use thiserror::Error;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// IO error
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be parsed
    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config values are inconsistent
    #[error("Config error: {0}")]
    Config(String),
}
