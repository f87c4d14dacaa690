//! Node provisioning strategies
//!
//! `FreshNodePerTest` starts and tears down one node per case and shares
//! nothing between workers. `ReuseByRuleset` keeps a single active node in a
//! mutex-guarded slot; a case holds the slot for its whole run, so no other
//! worker can replace the node while it is in use.

use async_trait::async_trait;
use probe_control::{ControlPlane, ControlResult, NodeParams};
use probe_rpc::NodeHandle;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// What a case needs from a node
#[derive(Debug, Clone)]
pub struct NodeRequest {
    /// Full creation parameters
    pub params: NodeParams,
    /// Sharing key, `None` when the node cannot be shared
    pub reuse_key: Option<String>,
}

/// Node assigned to one case
pub struct NodeLease {
    node: Arc<NodeHandle>,
    slot: Option<OwnedMutexGuard<Option<ActiveNode>>>,
}

impl NodeLease {
    fn owned(node: NodeHandle) -> Self {
        Self {
            node: Arc::new(node),
            slot: None,
        }
    }

    /// The node
    pub fn node(&self) -> &NodeHandle {
        &self.node
    }

    /// Whether the node outlives this lease
    pub fn is_shared(&self) -> bool {
        self.slot.is_some()
    }
}

/// Node currently held in the reuse slot
pub struct ActiveNode {
    key: String,
    node: Arc<NodeHandle>,
}

/// How nodes are obtained and released
#[async_trait]
pub trait NodeStrategy: Send + Sync {
    /// Obtain a node for one case
    async fn acquire(&self, control: &dyn ControlPlane, request: &NodeRequest) -> ControlResult<NodeLease>;

    /// Give the node back after the case finished
    async fn release(&self, control: &dyn ControlPlane, lease: NodeLease);

    /// Tear down anything still running at the end of a run
    async fn shutdown(&self, control: &dyn ControlPlane);
}

/// One node per case, destroyed as soon as the case finishes
#[derive(Debug, Default)]
pub struct FreshNodePerTest;

#[async_trait]
impl NodeStrategy for FreshNodePerTest {
    async fn acquire(&self, control: &dyn ControlPlane, request: &NodeRequest) -> ControlResult<NodeLease> {
        Ok(NodeLease::owned(control.new_node(&request.params).await?))
    }

    async fn release(&self, control: &dyn ControlPlane, lease: NodeLease) {
        control.release(lease.node()).await;
    }

    async fn shutdown(&self, _control: &dyn ControlPlane) {}
}

/// Share one node across consecutive cases with the same reuse key.
///
/// Cases without a reuse key get a private node, as with
/// `FreshNodePerTest`. The active node is replaced when a case with a
/// different key arrives, and destroyed by `shutdown`.
#[derive(Default)]
pub struct ReuseByRuleset {
    slot: Arc<Mutex<Option<ActiveNode>>>,
}

impl ReuseByRuleset {
    /// Empty slot
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NodeStrategy for ReuseByRuleset {
    async fn acquire(&self, control: &dyn ControlPlane, request: &NodeRequest) -> ControlResult<NodeLease> {
        let Some(key) = &request.reuse_key else {
            return Ok(NodeLease::owned(control.new_node(&request.params).await?));
        };

        let mut slot = Arc::clone(&self.slot).lock_owned().await;
        if let Some(active) = slot.as_ref() {
            if &active.key == key {
                tracing::debug!(node = %active.node.id(), "Reusing active node");
                let node = Arc::clone(&active.node);
                return Ok(NodeLease {
                    node,
                    slot: Some(slot),
                });
            }
        }
        if let Some(previous) = slot.take() {
            control.release(&previous.node).await;
        }

        let node = Arc::new(control.new_node(&request.params).await?);
        *slot = Some(ActiveNode {
            key: key.clone(),
            node: Arc::clone(&node),
        });
        Ok(NodeLease {
            node,
            slot: Some(slot),
        })
    }

    async fn release(&self, control: &dyn ControlPlane, lease: NodeLease) {
        if !lease.is_shared() {
            control.release(lease.node()).await;
        }
        // dropping the lease unlocks the slot
    }

    async fn shutdown(&self, control: &dyn ControlPlane) {
        if let Some(active) = self.slot.lock().await.take() {
            control.release(&active.node).await;
        }
    }
}
