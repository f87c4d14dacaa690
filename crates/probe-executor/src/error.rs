//! Executor error types

use probe_model::ModelError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to write a case's genesis and blocks to the workspace
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// Filesystem error
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path being written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Genesis could not be encoded
    #[error("Genesis encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// Block payload was not valid hex
    #[error("Block {index} payload: {source}")]
    Block {
        /// 1-based block index
        index: usize,
        /// Decoding error
        #[source]
        source: ModelError,
    },

    /// The case has no genesis to write
    #[error("Test case has no genesis")]
    MissingGenesis,
}

/// Run-level error
#[derive(Debug, Error)]
pub enum RunError {
    /// Suite could not be loaded
    #[error("Suite {path}: {source}")]
    Suite {
        /// Suite path
        path: PathBuf,
        /// Load error
        #[source]
        source: ModelError,
    },

    /// A worker task ended abnormally
    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Artifact result type
pub type ArtifactResult<T> = Result<T, ArtifactError>;
