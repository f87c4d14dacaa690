//! The control-plane seam

use async_trait::async_trait;
use probe_rpc::NodeHandle;
use std::time::Duration;

use crate::{ControlError, ControlResult, NodeParams, SubResult};

/// Node creation attempts before provisioning is reported as failed
pub const PROVISION_ATTEMPTS: u32 = 2;

/// Time budget for one provisioning attempt
pub const DEFAULT_PROVISION_TIMEOUT: Duration = Duration::from_secs(300);

/// Provisioning and reporting API (object-safe)
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Make one attempt to create a node and resolve its address
    async fn start_node(&self, params: &NodeParams) -> ControlResult<NodeHandle>;

    /// Destroy a node
    async fn kill_node(&self, node: &NodeHandle) -> ControlResult<()>;

    /// Post an operator-visible log line
    async fn log(&self, message: &str) -> ControlResult<()>;

    /// Post one report row
    async fn subresult(&self, result: &SubResult) -> ControlResult<()>;

    /// Client implementations available for fan-out
    async fn list_client_types(&self) -> ControlResult<Vec<String>>;

    /// Time budget for one provisioning attempt
    fn provision_timeout(&self) -> Duration {
        DEFAULT_PROVISION_TIMEOUT
    }

    /// Create a node, retrying up to `PROVISION_ATTEMPTS` times
    async fn new_node(&self, params: &NodeParams) -> ControlResult<NodeHandle> {
        let timeout = self.provision_timeout();
        let mut last = None;
        for attempt in 1..=PROVISION_ATTEMPTS {
            let result = match tokio::time::timeout(timeout, self.start_node(params)).await {
                Ok(result) => result,
                Err(_) => Err(ControlError::Timeout(timeout)),
            };
            match result {
                Ok(node) => return Ok(node),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Failed to start node");
                    if attempt < PROVISION_ATTEMPTS {
                        self.notify("Failed to start node, trying again").await;
                    }
                    last = Some(e);
                }
            }
        }
        Err(ControlError::Provision {
            attempts: PROVISION_ATTEMPTS,
            last: Box::new(last.unwrap_or(ControlError::Timeout(timeout))),
        })
    }

    /// Destroy a node; failures are logged and otherwise ignored
    async fn release(&self, node: &NodeHandle) {
        if let Err(e) = self.kill_node(node).await {
            tracing::warn!(node = %node.id(), error = %e, "Failed to kill node");
        }
    }

    /// Post a log line, falling back to local logging
    async fn notify(&self, message: &str) {
        if let Err(e) = self.log(message).await {
            tracing::warn!(error = %e, message, "Failed to post log line");
        }
    }

    /// Post a report row, falling back to local logging
    async fn report(&self, result: &SubResult) {
        if let Err(e) = self.subresult(result).await {
            tracing::warn!(test = %result.name, success = result.success, error = %e, "Failed to post subresult");
        }
    }
}
