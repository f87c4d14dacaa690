//! Genesis normalization
//!
//! Fixtures omit `0x` on some header fields and store storage words
//! unpadded. Clients expect both in canonical form, so the genesis file
//! handed to a node is rebuilt from the raw header and pre-state.

use crate::hex_utils::{ensure_hex_prefix, pad_hash, strip_hex_prefix};
use crate::types::{AccountMap, AccountSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Header fields that must carry a `0x` prefix
pub const HEX_HEADER_FIELDS: [&str; 9] = [
    "nonce",
    "coinbase",
    "hash",
    "mixHash",
    "parentHash",
    "receiptTrie",
    "stateRoot",
    "transactionsTrie",
    "uncleHash",
];

/// Normalized description of block 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisSpec {
    /// Header fields, in fixture order
    #[serde(flatten)]
    pub header: Map<String, Value>,
    /// Initial allocations keyed by address without `0x`
    pub alloc: BTreeMap<String, AccountSpec>,
}

impl GenesisSpec {
    /// Build a genesis from a raw header and pre-state
    pub fn build(raw_header: &Map<String, Value>, pre: &AccountMap) -> Self {
        let mut header = raw_header.clone();
        header.remove("alloc");

        for field in HEX_HEADER_FIELDS {
            if let Some(Value::String(value)) = header.get_mut(field) {
                *value = ensure_hex_prefix(value);
            }
        }

        let alloc = pre
            .iter()
            .map(|(address, account)| {
                let storage = account.storage.as_ref().map(|storage| {
                    storage
                        .iter()
                        .map(|(slot, value)| (pad_hash(slot), pad_hash(value)))
                        .collect()
                });
                let account = AccountSpec {
                    storage,
                    ..account.clone()
                };
                (strip_hex_prefix(address).to_string(), account)
            })
            .collect();

        Self { header, alloc }
    }

    /// Fixed genesis used for transaction tests: no allocations, no hash checks
    pub fn transaction_default() -> Self {
        let mut header = Map::new();
        let fields = [
            ("bloom", format!("0x{}", "0".repeat(512))),
            ("coinbase", "0x0000000000000000000000000000000000000001".to_string()),
            ("difficulty", "0x0386a0".to_string()),
            ("extraData", "0x42".to_string()),
            ("gasLimit", "0x2fefd8".to_string()),
            ("gasUsed", "0x00".to_string()),
            ("nonce", "0x0102030405060708".to_string()),
            ("number", "0x00".to_string()),
            ("parentHash", pad_hash("0")),
            ("receiptTrie", EMPTY_TRIE_ROOT.to_string()),
            ("transactionsTrie", EMPTY_TRIE_ROOT.to_string()),
            ("uncleHash", EMPTY_UNCLE_HASH.to_string()),
        ];
        for (key, value) in fields {
            header.insert(key.to_string(), Value::String(value));
        }
        Self {
            header,
            alloc: BTreeMap::new(),
        }
    }

    fn header_str(&self, field: &str) -> Option<&str> {
        self.header.get(field).and_then(Value::as_str)
    }

    /// Expected block-0 hash
    pub fn hash(&self) -> Option<&str> {
        self.header_str("hash")
    }

    /// Expected block-0 state root
    pub fn state_root(&self) -> Option<&str> {
        self.header_str("stateRoot")
    }

    /// Total accounts plus storage entries, a rough size for progress notices
    pub fn alloc_size(&self) -> usize {
        self.alloc
            .values()
            .map(|account| 1 + account.storage_len())
            .sum()
    }
}

const EMPTY_TRIE_ROOT: &str = "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421";
const EMPTY_UNCLE_HASH: &str = "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347";
