//! HTTP control-plane client

use async_trait::async_trait;
use probe_rpc::NodeHandle;
use std::time::Duration;

use crate::client::{ControlPlane, DEFAULT_PROVISION_TIMEOUT};
use crate::{ControlError, ControlResult, NodeParams, SubResult};

/// Connection settings for `HttpControlPlane`
#[derive(Debug, Clone)]
pub struct HttpControlPlaneConfig {
    /// Base URL, e.g. `http://127.0.0.1:8080`
    pub base_url: String,
    /// JSON-RPC port on provisioned nodes
    pub rpc_port: u16,
    /// Timeout of each node RPC call
    pub rpc_timeout: Duration,
    /// Time budget of one provisioning attempt
    pub provision_timeout: Duration,
}

impl HttpControlPlaneConfig {
    /// Settings with default ports and timeouts
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            rpc_port: 8545,
            rpc_timeout: Duration::from_secs(30),
            provision_timeout: DEFAULT_PROVISION_TIMEOUT,
        }
    }
}

/// Control plane reached over HTTP
pub struct HttpControlPlane {
    client: reqwest::Client,
    config: HttpControlPlaneConfig,
}

impl HttpControlPlane {
    /// Create a client; the underlying connection pool is shared by all workers
    pub fn new(mut config: HttpControlPlaneConfig) -> ControlResult<Self> {
        let trimmed = config.base_url.trim_end_matches('/').len();
        config.base_url.truncate(trimmed);
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    /// Base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn check(operation: &'static str, response: reqwest::Response) -> ControlResult<String> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ControlError::Status {
                operation,
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn start_node(&self, params: &NodeParams) -> ControlResult<NodeHandle> {
        let query: Vec<(&str, &str)> = params.iter().collect();
        let response = self
            .client
            .post(self.url("/nodes"))
            .query(&query)
            .send()
            .await?;
        let id = Self::check("create node", response).await?.trim().to_string();

        let response = self
            .client
            .get(self.url(&format!("/nodes/{}", id)))
            .send()
            .await?;
        let ip = Self::check("get node address", response).await?.trim().to_string();

        tracing::debug!(node = %id, %ip, "Node started");
        Ok(NodeHandle::connect(
            id,
            ip,
            self.config.rpc_port,
            self.config.rpc_timeout,
        )?)
    }

    async fn kill_node(&self, node: &NodeHandle) -> ControlResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/nodes/{}", node.id())))
            .send()
            .await?;
        Self::check("delete node", response).await?;
        Ok(())
    }

    async fn log(&self, message: &str) -> ControlResult<()> {
        let response = self
            .client
            .post(self.url("/logs"))
            .body(message.to_string())
            .send()
            .await?;
        Self::check("post log", response).await?;
        Ok(())
    }

    async fn subresult(&self, result: &SubResult) -> ControlResult<()> {
        let mut query = vec![
            ("name", result.name.clone()),
            ("success", result.success.to_string()),
        ];
        if let Some(error) = &result.error {
            query.push(("error", error.clone()));
        }
        let details = result.details_json()?;
        let response = self
            .client
            .post(self.url("/subresults"))
            .query(&query)
            .form(&[("details", details)])
            .send()
            .await?;
        Self::check("post subresult", response).await?;
        Ok(())
    }

    async fn list_client_types(&self) -> ControlResult<Vec<String>> {
        let response = self.client.get(self.url("/clients")).send().await?;
        let body = Self::check("list clients", response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn provision_timeout(&self) -> Duration {
        self.config.provision_timeout
    }
}
