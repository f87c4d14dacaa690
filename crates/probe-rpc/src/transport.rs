//! Transport layer for node RPC

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use crate::{RpcError, RpcResult};

/// Transport trait for RPC communication (object-safe)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return its `result` member
    async fn request_json(&self, id: u64, method: &str, params: Vec<Value>) -> RpcResult<Value>;
}

/// Extract `result` from a JSON-RPC response envelope.
///
/// A present `result` is returned even when it is `null`.
pub fn parse_response(response: Value) -> RpcResult<Value> {
    let mut object = match response {
        Value::Object(object) => object,
        other => return Err(RpcError::MissingResult(other.to_string())),
    };
    if let Some(result) = object.remove("result") {
        return Ok(result);
    }
    match object.remove("error") {
        Some(error) => {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(-32603);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            Err(RpcError::Rpc { code, message })
        }
        None => Err(RpcError::MissingResult(Value::Object(object).to_string())),
    }
}

type Reply = Result<Value, (i64, String)>;

struct Script {
    method: String,
    params: Vec<Value>,
    reply: Reply,
}

/// Mock transport for testing.
///
/// Replies are scripted per method, optionally narrowed to calls whose
/// leading parameters match. The most recently scripted match wins, then the
/// built-in defaults, then "method not found". Clones share state, so a test
/// can keep one clone to inspect calls made through a node.
#[derive(Clone)]
pub struct MockTransport {
    scripts: Arc<Mutex<Vec<Script>>>,
    calls: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
}

/// Block returned for `eth_getBlockByNumber` when nothing is scripted
pub const MOCK_BLOCK_HASH: &str =
    "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";

/// Client version reported when nothing is scripted
pub const MOCK_CLIENT_VERSION: &str = "MockClient/v1.0.0";

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn push(&self, method: &str, params: Vec<Value>, reply: Reply) {
        self.scripts.lock().push(Script {
            method: method.to_string(),
            params,
            reply,
        });
    }

    /// Set the response for every call of `method`
    pub fn set_response(&self, method: &str, response: Value) {
        self.push(method, Vec::new(), Ok(response));
    }

    /// Set the response for calls whose parameters start with `params`
    pub fn set_response_for(&self, method: &str, params: Vec<Value>, response: Value) {
        self.push(method, params, Ok(response));
    }

    /// Make every call of `method` fail with an RPC error object
    pub fn set_error(&self, method: &str, code: i64, message: &str) {
        self.push(method, Vec::new(), Err((code, message.to_string())));
    }

    /// Make calls whose parameters start with `params` fail
    pub fn set_error_for(&self, method: &str, params: Vec<Value>, code: i64, message: &str) {
        self.push(method, params, Err((code, message.to_string())));
    }

    /// Clear scripted responses (recorded calls are kept)
    pub fn clear_responses(&self) {
        self.scripts.lock().clear();
    }

    /// All calls received, in order
    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().clone()
    }

    /// Number of calls received
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Number of calls received for one method
    pub fn calls_to(&self, method: &str) -> usize {
        self.calls.lock().iter().filter(|(m, _)| m == method).count()
    }

    fn default_response(method: &str) -> Option<Value> {
        let value = match method {
            "web3_clientVersion" => Value::String(MOCK_CLIENT_VERSION.to_string()),
            "eth_getTransactionCount" => Value::String("0x0".to_string()),
            "eth_getBalance" => Value::String("0x0".to_string()),
            "eth_getCode" => Value::String("0x".to_string()),
            "eth_getStorageAt" => Value::String("0x0".to_string()),
            "eth_sendRawTransaction" => Value::String(MOCK_BLOCK_HASH.to_string()),
            "eth_getTransactionByHash" => Value::Null,
            "eth_getBlockByNumber" => serde_json::json!({
                "number": "0x0",
                "hash": MOCK_BLOCK_HASH,
                "stateRoot": MOCK_BLOCK_HASH,
            }),
            _ => return None,
        };
        Some(value)
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request_json(&self, _id: u64, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        let scripted = self
            .scripts
            .lock()
            .iter()
            .rev()
            .find(|script| script.method == method && params.starts_with(&script.params))
            .map(|script| script.reply.clone());
        self.calls.lock().push((method.to_string(), params));

        match scripted {
            Some(Ok(value)) => Ok(value),
            Some(Err((code, message))) => Err(RpcError::Rpc { code, message }),
            None => Self::default_response(method).ok_or_else(|| RpcError::Rpc {
                code: -32601,
                message: format!("Method not found: {}", method),
            }),
        }
    }
}

/// HTTP transport for real RPC communication
#[cfg(feature = "http")]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

#[cfg(feature = "http")]
impl HttpTransport {
    /// Create a transport posting to `url`, failing calls after `timeout`
    pub fn new(url: &str, timeout: std::time::Duration) -> RpcResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Endpoint URL
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(feature = "http")]
fn map_reqwest(e: reqwest::Error) -> RpcError {
    if e.is_timeout() {
        RpcError::Timeout(e.to_string())
    } else {
        RpcError::Transport(e.to_string())
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Transport for HttpTransport {
    async fn request_json(&self, id: u64, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response: Value = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest)?
            .json()
            .await
            .map_err(map_reqwest)?;

        parse_response(response)
    }
}
