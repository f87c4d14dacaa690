//! Node handle - typed RPC proxy for one running client

use probe_model::hex_utils::{parse_hex_u256, parse_hex_u64};
use probe_model::U256;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::OnceCell;

use crate::transport::Transport;
use crate::types::BlockSummary;
use crate::RpcResult;

#[cfg(feature = "http")]
use crate::transport::HttpTransport;

/// One provisioned client node
pub struct NodeHandle {
    id: String,
    address: String,
    transport: Box<dyn Transport>,
    rpc_calls: AtomicU64,
    client_version: OnceCell<String>,
}

impl NodeHandle {
    /// Create a handle over a custom transport
    pub fn new(
        id: impl Into<String>,
        address: impl Into<String>,
        transport: impl Transport + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            transport: Box::new(transport),
            rpc_calls: AtomicU64::new(0),
            client_version: OnceCell::new(),
        }
    }

    /// Create a handle talking JSON-RPC over HTTP to `address:port`
    #[cfg(feature = "http")]
    pub fn connect(
        id: impl Into<String>,
        address: impl Into<String>,
        port: u16,
        timeout: std::time::Duration,
    ) -> RpcResult<Self> {
        let address = address.into();
        let transport = HttpTransport::new(&format!("http://{}:{}", address, port), timeout)?;
        Ok(Self::new(id, address, transport))
    }

    /// Control-plane id of the node
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Network address of the node
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Number of RPC calls issued so far
    pub fn rpc_count(&self) -> u64 {
        self.rpc_calls.load(Ordering::Relaxed)
    }

    /// Raw call; the request id is the running call count
    pub async fn call(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        let id = self.rpc_calls.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(node = %self.id, id, method, "RPC call");
        self.transport.request_json(id, method, params).await
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> RpcResult<T> {
        let value = self.call(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    // ==================== Node Info ====================

    /// Client version string, fetched once per handle
    pub async fn client_version(&self) -> RpcResult<&str> {
        let version = self
            .client_version
            .get_or_try_init(|| self.request::<String>("web3_clientVersion", vec![]))
            .await?;
        Ok(version.as_str())
    }

    /// Client version if it has already been fetched
    pub fn cached_client_version(&self) -> Option<&str> {
        self.client_version.get().map(String::as_str)
    }

    // ==================== Block Queries ====================

    /// Block at height `number`, `None` if the node does not have it
    pub async fn get_block_by_number(&self, number: u64) -> RpcResult<Option<BlockSummary>> {
        self.request(
            "eth_getBlockByNumber",
            vec![Value::String(format!("0x{:x}", number)), Value::Bool(true)],
        )
        .await
    }

    /// Current head block
    pub async fn get_latest_block(&self) -> RpcResult<Option<BlockSummary>> {
        self.request(
            "eth_getBlockByNumber",
            vec![Value::String("latest".to_string()), Value::Bool(true)],
        )
        .await
    }

    // ==================== Account Queries ====================

    /// Account nonce at the latest block
    pub async fn get_nonce(&self, address: &str) -> RpcResult<u64> {
        let result: String = self
            .request("eth_getTransactionCount", account_params(address))
            .await?;
        Ok(parse_hex_u64(&result)?)
    }

    /// Account balance at the latest block
    pub async fn get_balance(&self, address: &str) -> RpcResult<U256> {
        let result: String = self.request("eth_getBalance", account_params(address)).await?;
        Ok(parse_hex_u256(&result)?)
    }

    /// Account code as returned by the node (hex string)
    pub async fn get_code(&self, address: &str) -> RpcResult<String> {
        self.request("eth_getCode", account_params(address)).await
    }

    /// Storage word at `slot`
    pub async fn get_storage_at(&self, address: &str, slot: &str) -> RpcResult<U256> {
        let result: String = self
            .request(
                "eth_getStorageAt",
                vec![
                    Value::String(address.to_string()),
                    Value::String(slot.to_string()),
                    Value::String("latest".to_string()),
                ],
            )
            .await?;
        Ok(parse_hex_u256(&result)?)
    }

    // ==================== Transactions ====================

    /// Submit a signed transaction, returning its hash
    pub async fn send_raw_transaction(&self, rlp: &str) -> RpcResult<String> {
        self.request("eth_sendRawTransaction", vec![Value::String(rlp.to_string())])
            .await
    }

    /// Transaction by hash, `None` when unknown to the node
    pub async fn get_transaction_by_hash(&self, hash: &str) -> RpcResult<Option<Value>> {
        let value = self
            .call("eth_getTransactionByHash", vec![Value::String(hash.to_string())])
            .await?;
        Ok(if value.is_null() { None } else { Some(value) })
    }
}

fn account_params(address: &str) -> Vec<Value> {
    vec![
        Value::String(address.to_string()),
        Value::String("latest".to_string()),
    ]
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("rpc_calls", &self.rpc_count())
            .finish()
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node[{}]@{}", self.id, self.address)
    }
}
