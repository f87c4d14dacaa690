//! Type definitions for the ethereum/tests JSON suite formats
//!
//! Only the fields the orchestrator consumes are modelled. Every top-level
//! field is optional so that a partially populated case still deserializes
//! and validation can name every missing key at once.

use crate::error::ModelResult;
use crate::hex_utils::decode_hex_bytes;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Account state, used both for the pre-state and for expected post-state.
///
/// Each attribute is independent: a post-state entry only constrains the
/// attributes it actually lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSpec {
    /// Balance (hex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    /// Code (hex byte string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Nonce (hex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Storage slot to value (hex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<BTreeMap<String, String>>,
}

impl AccountSpec {
    /// Number of expected storage entries
    pub fn storage_len(&self) -> usize {
        self.storage.as_ref().map_or(0, BTreeMap::len)
    }
}

/// Account map keyed by address
pub type AccountMap = BTreeMap<String, AccountSpec>;

/// One encoded block of a blockchain test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlock {
    /// RLP-encoded block (hex)
    pub rlp: String,
}

impl RawBlock {
    /// Decode the hex payload into the bytes written to disk
    pub fn decode_rlp(&self) -> ModelResult<Bytes> {
        decode_hex_bytes(&self.rlp).map(Bytes::from)
    }
}

/// A blockchain test as stored in the suite file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBlockTest {
    /// Pre-state
    pub pre: Option<AccountMap>,
    /// Blocks to import, in order
    pub blocks: Option<Vec<RawBlock>>,
    /// Expected post-state
    pub post_state: Option<AccountMap>,
    /// Raw genesis header fields
    pub genesis_block_header: Option<Map<String, Value>>,
    /// Ruleset profile name
    pub network: Option<String>,
    /// Seal engine, `NoProof` disables proof-of-work checks
    pub seal_engine: Option<String>,
    /// Expected hash of the last block
    #[serde(rename = "lastblockhash")]
    pub last_block_hash: Option<String>,
}

impl RawBlockTest {
    /// Names of required keys that are absent, in declaration order
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.pre.is_none() {
            missing.push("pre");
        }
        if self.blocks.is_none() {
            missing.push("blocks");
        }
        if self.post_state.is_none() {
            missing.push("postState");
        }
        if self.genesis_block_header.is_none() {
            missing.push("genesisBlockHeader");
        }
        if self.network.is_none() {
            missing.push("network");
        }
        missing
    }

    /// Whether proof-of-work checking must be disabled
    pub fn skip_pow(&self) -> bool {
        self.seal_engine.as_deref() == Some("NoProof")
    }
}

/// A transaction test as stored in the suite file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTransactionTest {
    /// RLP-encoded transaction (hex, possibly deliberately invalid)
    pub rlp: Option<String>,
    /// Recovered sender; present only when the transaction is valid
    pub sender: Option<String>,
    /// Expected transaction hash
    pub hash: Option<String>,
    /// Mainnet block number the transaction is evaluated at (decimal)
    pub blocknumber: Option<String>,
    /// Explicit ruleset profile
    pub network: Option<String>,
}

impl RawTransactionTest {
    /// Whether the node is expected to accept the transaction
    pub fn should_succeed(&self) -> bool {
        self.sender.is_some()
    }

    /// Block number as an integer; unparsable values count as genesis
    pub fn block_number(&self) -> Option<u64> {
        self.blocknumber
            .as_deref()
            .map(|n| n.trim().parse::<u64>().unwrap_or(0))
    }
}
