//! Scripted control plane for tests

use async_trait::async_trait;
use parking_lot::Mutex;
use probe_rpc::{MockTransport, NodeHandle};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::client::ControlPlane;
use crate::{ControlError, ControlResult, NodeParams, SubResult};

type Factory = Box<dyn Fn(&NodeParams) -> MockTransport + Send + Sync>;
type Predicate = Box<dyn Fn(&NodeParams) -> bool + Send + Sync>;

/// Control plane whose nodes are `MockTransport`s.
///
/// Node ids are `mock-node-<n>`, unique per instance. Every interaction is
/// recorded for later assertions.
pub struct MockControlPlane {
    factory: Factory,
    reject: Option<Predicate>,
    clients: Vec<String>,
    provision_delay: Option<Duration>,
    next_id: AtomicU64,
    live: AtomicUsize,
    peak_live: AtomicUsize,
    attempts: AtomicUsize,
    created: Mutex<Vec<(String, NodeParams)>>,
    killed: Mutex<Vec<String>>,
    logs: Mutex<Vec<String>>,
    subresults: Mutex<Vec<SubResult>>,
}

impl MockControlPlane {
    /// Every node gets a fresh default `MockTransport`
    pub fn new() -> Self {
        Self::with_factory(|_| MockTransport::new())
    }

    /// Nodes are built by `factory` from their creation parameters
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn(&NodeParams) -> MockTransport + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            reject: None,
            clients: vec!["mock".to_string()],
            provision_delay: None,
            next_id: AtomicU64::new(1),
            live: AtomicUsize::new(0),
            peak_live: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
            killed: Mutex::new(Vec::new()),
            logs: Mutex::new(Vec::new()),
            subresults: Mutex::new(Vec::new()),
        }
    }

    /// Refuse to start nodes whose parameters match `predicate`
    pub fn reject_when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&NodeParams) -> bool + Send + Sync + 'static,
    {
        self.reject = Some(Box::new(predicate));
        self
    }

    /// Client types returned by `list_client_types`
    pub fn with_clients(mut self, clients: &[&str]) -> Self {
        self.clients = clients.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Sleep before each node start
    pub fn with_provision_delay(mut self, delay: Duration) -> Self {
        self.provision_delay = Some(delay);
        self
    }

    /// Nodes created so far, with their parameters
    pub fn created(&self) -> Vec<(String, NodeParams)> {
        self.created.lock().clone()
    }

    /// Ids of killed nodes
    pub fn killed(&self) -> Vec<String> {
        self.killed.lock().clone()
    }

    /// Posted log lines
    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().clone()
    }

    /// Posted sub-results
    pub fn subresults(&self) -> Vec<SubResult> {
        self.subresults.lock().clone()
    }

    /// Start attempts, including rejected ones
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Nodes started and not yet killed
    pub fn live_nodes(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously live nodes
    pub fn peak_live_nodes(&self) -> usize {
        self.peak_live.load(Ordering::SeqCst)
    }
}

impl Default for MockControlPlane {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn start_node(&self, params: &NodeParams) -> ControlResult<NodeHandle> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.provision_delay {
            tokio::time::sleep(delay).await;
        }
        if self.reject.as_ref().map_or(false, |reject| reject(params)) {
            return Err(ControlError::Mock("node start rejected".to_string()));
        }

        let id = format!("mock-node-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let transport = (self.factory)(params);
        self.created.lock().push((id.clone(), params.clone()));

        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_live.fetch_max(live, Ordering::SeqCst);

        Ok(NodeHandle::new(id, "127.0.0.1", transport))
    }

    async fn kill_node(&self, node: &NodeHandle) -> ControlResult<()> {
        self.killed.lock().push(node.id().to_string());
        self.live.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn log(&self, message: &str) -> ControlResult<()> {
        self.logs.lock().push(message.to_string());
        Ok(())
    }

    async fn subresult(&self, result: &SubResult) -> ControlResult<()> {
        self.subresults.lock().push(result.clone());
        Ok(())
    }

    async fn list_client_types(&self) -> ControlResult<Vec<String>> {
        Ok(self.clients.clone())
    }

    fn provision_timeout(&self) -> Duration {
        Duration::from_secs(5)
    }
}
