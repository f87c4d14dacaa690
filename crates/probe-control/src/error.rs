//! Control-plane error types

use probe_rpc::RpcError;
use thiserror::Error;

/// Control-plane error type
#[derive(Debug, Error)]
pub enum ControlError {
    /// Request could not be sent or its response read
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-2xx response
    #[error("Failed to {operation} ({status}): {body}")]
    Status {
        /// What was being attempted
        operation: &'static str,
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },

    /// Provisioning attempt exceeded its time budget
    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Every provisioning attempt failed
    #[error("Failed to start node after {attempts} attempts: {last}")]
    Provision {
        /// Attempts made
        attempts: u32,
        /// Error of the final attempt
        last: Box<ControlError>,
    },

    /// Node handle could not be created
    #[error("Node RPC setup failed: {0}")]
    Rpc(#[from] RpcError),

    /// Response body had an unexpected shape
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Rejected by a scripted control plane
    #[error("Mock control plane: {0}")]
    Mock(String),
}

impl From<serde_json::Error> for ControlError {
    fn from(e: serde_json::Error) -> Self {
        ControlError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for ControlError {
    fn from(e: reqwest::Error) -> Self {
        ControlError::Http(e.to_string())
    }
}

/// Control-plane result type
pub type ControlResult<T> = Result<T, ControlError>;
