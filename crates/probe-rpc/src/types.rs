//! RPC result shapes

use serde::Deserialize;

/// Fields of `eth_getBlockByNumber` the verifier compares
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSummary {
    /// Block number (hex)
    #[serde(default)]
    pub number: Option<String>,
    /// Block hash
    #[serde(default)]
    pub hash: String,
    /// State root
    #[serde(default)]
    pub state_root: String,
}
