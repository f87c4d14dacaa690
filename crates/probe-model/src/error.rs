//! Error types for the test-suite model

use thiserror::Error;

/// Model error type
#[derive(Error, Debug)]
pub enum ModelError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Hex decoding error
    #[error("Hex error: {0}")]
    Hex(String),

    /// Suite document has an unexpected shape
    #[error("Malformed suite: {0}")]
    MalformedSuite(String),

    /// Test case failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<hex::FromHexError> for ModelError {
    fn from(e: hex::FromHexError) -> Self {
        ModelError::Hex(e.to_string())
    }
}

/// Reasons a test case is rejected before any node is started
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required top-level keys are absent
    #[error("Missing keys: {}", .0.join(","))]
    MissingKeys(Vec<&'static str>),

    /// The declared network is not in the ruleset table
    #[error("Network `{0}` not defined in ruleset")]
    UnknownNetwork(String),

    /// The case body could not be parsed into the expected shape
    #[error("Malformed test case: {0}")]
    Malformed(String),
}

/// Model result type
pub type ModelResult<T> = Result<T, ModelError>;
