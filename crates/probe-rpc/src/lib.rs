//! # probe-rpc
//!
//! JSON-RPC access to a running client node.
//!
//! ## Features
//!
//! - **Transport**: object-safe request/response seam
//! - **HttpTransport**: JSON-RPC 2.0 over HTTP POST with a per-call timeout
//! - **MockTransport**: scripted node for tests
//! - **NodeHandle**: typed accessors (blocks, nonce, balance, code, storage,
//!   raw transactions, client version) with a per-node call counter
//!
//! No retries happen at this layer; callers decide what a failed call means.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use probe_rpc::{MockTransport, NodeHandle};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), probe_rpc::RpcError> {
//!     let node = NodeHandle::new("node-1", "127.0.0.1", MockTransport::new());
//!     let genesis = node.get_block_by_number(0).await?;
//!     println!("{:?} after {} calls", genesis, node.rpc_count());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod node;
pub mod transport;
mod types;

pub use error::{RpcError, RpcResult};
pub use node::NodeHandle;
pub use transport::{MockTransport, Transport};
pub use types::BlockSummary;

#[cfg(feature = "http")]
pub use transport::HttpTransport;
