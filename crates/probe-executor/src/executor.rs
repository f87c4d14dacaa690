//! Single-case execution flow
//!
//! artefacts -> node -> preconditions -> postconditions -> release -> report.
//! Every failure along the way ends in a terminal case status; nothing is
//! propagated to the caller.

use crate::artefacts::ArtefactStore;
use crate::params;
use crate::strategy::{NodeRequest, NodeStrategy};
use crate::verify::{self, TransactionOutcome};
use futures::FutureExt;
use probe_control::{ControlPlane, SubResult};
use probe_model::{AccountMap, Message, Payload, RulesetProfile, TestCase, TestStatus};
use probe_rpc::NodeHandle;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Runs cases against provisioned nodes and reports their outcome
pub struct TestExecutor {
    control: Arc<dyn ControlPlane>,
    strategy: Arc<dyn NodeStrategy>,
    artefacts: ArtefactStore,
    client: Option<String>,
}

impl TestExecutor {
    /// Create an executor
    pub fn new(
        control: Arc<dyn ControlPlane>,
        strategy: Arc<dyn NodeStrategy>,
        artefacts: ArtefactStore,
    ) -> Self {
        Self {
            control,
            strategy,
            artefacts,
            client: None,
        }
    }

    /// Start nodes of a specific client implementation
    pub fn with_client(mut self, client: Option<String>) -> Self {
        self.client = client;
        self
    }

    /// Control plane in use
    pub fn control(&self) -> &dyn ControlPlane {
        self.control.as_ref()
    }

    /// Client implementation, if pinned
    pub fn client(&self) -> Option<&str> {
        self.client.as_deref()
    }

    /// Tear down nodes kept alive by the strategy
    pub async fn shutdown(&self) {
        self.strategy.shutdown(self.control.as_ref()).await;
    }

    /// Run one validated case to a terminal status and report it
    pub async fn execute(&self, case: &mut TestCase, profile: &'static RulesetProfile) {
        let paths = match self.artefacts.write(case).await {
            Ok(paths) => paths,
            Err(e) => {
                case.fail(vec![
                    "Failed to write test data to disk".into(),
                    e.to_string().into(),
                ]);
                self.finish(case).await;
                return;
            }
        };

        let started = Instant::now();
        let ruleset = params::ruleset_params(profile, case.skip_pow(), self.client.as_deref());
        let reuse_key = case
            .genesis_spec()
            .and_then(|genesis| params::reuse_key(&ruleset, genesis, case.blocks().len()));
        let request = NodeRequest {
            params: params::with_artefacts(ruleset, &paths),
            reuse_key,
        };

        tracing::debug!(case = %case.full_name(), ruleset = %profile, "Starting client node");
        self.control
            .notify(&format!("Starting client node for test {}", case))
            .await;

        match self.strategy.acquire(self.control.as_ref(), &request).await {
            Ok(lease) => {
                let node = lease.node();
                case.set_node_id(node.id());
                self.log_client_version(node).await;

                let verdict = AssertUnwindSafe(self.verify(case, node))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        Err(vec!["Test execution aborted".into(), panic_message(&*panic).into()])
                    });
                match verdict {
                    Ok(()) => case.succeed(),
                    Err(messages) => case.fail(messages),
                };
                self.strategy.release(self.control.as_ref(), lease).await;
            }
            Err(e) => {
                case.fail(vec!["Failed to start client node".into(), e.to_string().into()]);
            }
        }

        case.set_elapsed(started.elapsed());
        self.finish(case).await;
    }

    async fn log_client_version(&self, node: &NodeHandle) {
        if node.cached_client_version().is_some() {
            return;
        }
        match node.client_version().await {
            Ok(version) => {
                tracing::info!(node = %node.id(), version, "Client version");
                self.control
                    .notify(&format!("Client version: {}", version))
                    .await;
            }
            Err(e) => tracing::warn!(node = %node.id(), error = %e, "Failed to fetch client version"),
        }
    }

    async fn verify(&self, case: &TestCase, node: &NodeHandle) -> Result<(), Vec<Message>> {
        match case.payload() {
            Payload::Block(raw) => {
                let genesis = case
                    .genesis_spec()
                    .ok_or_else(|| vec![Message::from("Test case has no genesis")])?;

                let pre = verify::verify_preconditions(node, genesis).await;
                if !pre.is_empty() {
                    return Err(vec!["Preconditions failed".into(), pre.into_message()]);
                }

                let empty = AccountMap::new();
                let post_state = raw.post_state.as_ref().unwrap_or(&empty);
                let post = verify::verify_postconditions(
                    node,
                    self.control.as_ref(),
                    raw.last_block_hash.as_deref(),
                    post_state,
                )
                .await;
                if !post.is_empty() {
                    return Err(vec!["Postcondition check failed".into(), post.into_message()]);
                }
                Ok(())
            }
            Payload::Transaction(raw) => match verify::verify_transaction(node, raw).await {
                TransactionOutcome::Passed => Ok(()),
                TransactionOutcome::Failed(messages) => Err(messages),
            },
            Payload::Malformed(reason) => Err(vec![
                "Testcase failed initial validation".into(),
                reason.clone().into(),
            ]),
        }
    }

    /// Log the status line and post the case's sub-result
    pub async fn finish(&self, case: &TestCase) {
        let status = case.status();
        match status {
            TestStatus::Failed => tracing::warn!(
                test = %case.full_name(),
                %status,
                node = case.node_id().unwrap_or("-"),
                ms = case.elapsed_ms().unwrap_or(0),
                error = %case.top_level_error().unwrap_or_default(),
                "Test finished"
            ),
            _ => tracing::info!(
                test = %case.full_name(),
                %status,
                node = case.node_id().unwrap_or("-"),
                ms = case.elapsed_ms().unwrap_or(0),
                "Test finished"
            ),
        }
        self.control
            .notify(&format!("Test: {} {} ({})", case.suite(), case.name(), status))
            .await;
        self.control
            .report(&SubResult::from_case(case, self.client.as_deref()))
            .await;
    }
}

/// Text of a panic payload
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "panic with non-string payload".to_string())
}
