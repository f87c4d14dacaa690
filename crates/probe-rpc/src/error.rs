//! RPC error types

use thiserror::Error;

/// Error from a node RPC call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RpcError {
    /// Connection or HTTP-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The call did not complete in time
    #[error("RPC timeout: {0}")]
    Timeout(String),

    /// Error object returned by the node
    #[error("RPC error: {code} - {message}")]
    Rpc {
        /// Error code
        code: i64,
        /// Error message
        message: String,
    },

    /// Response had neither `result` nor `error`
    #[error("No result in response: {0}")]
    MissingResult(String),

    /// Numeric result was not valid hex
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Result had an unexpected shape
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        RpcError::Serialization(e.to_string())
    }
}

impl From<probe_model::ModelError> for RpcError {
    fn from(e: probe_model::ModelError) -> Self {
        RpcError::InvalidHex(e.to_string())
    }
}

/// RPC result type
pub type RpcResult<T> = Result<T, RpcError>;
