//! Verification protocol
//!
//! Preconditions compare block 0 with the case's genesis. Postconditions
//! either confirm the expected chain head (fast path) or walk the expected
//! post-state account by account. Mismatches are collected in `Findings`;
//! RPC failures during the per-account walk abort it with a single entry.

use probe_control::ControlPlane;
use probe_model::hex_utils::{
    canonicalize, ensure_hex_prefix, low_word, parse_hex_u256, parse_hex_u64,
};
use probe_model::{AccountMap, AccountSpec, GenesisSpec, Message, RawTransactionTest};
use probe_rpc::{NodeHandle, RpcError};
use std::fmt;

/// Entries allowed before the per-account walk is abandoned
pub const MAX_POSTCONDITION_ERRORS: usize = 9;

/// Appended once when the walk is abandoned
pub const ABORT_NOTICE: &str = "Postcondition check aborted due to earlier errors";

/// RPC calls between progress notices
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Accounts or storage keys above which a "may take a while" notice is posted
pub const LARGE_CHECK: usize = 1000;

/// Ordered list of recorded comparison failures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    entries: Vec<String>,
}

impl Findings {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure
    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    /// Record a value mismatch
    pub fn mismatch(&mut self, label: impl fmt::Display, found: impl fmt::Display, expected: impl fmt::Display) {
        self.push(format!("{}: found `{}`, expected `{}`", label, found, expected));
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Recorded entries
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Whether the per-account walk must stop
    fn over_limit(&self) -> bool {
        self.entries.len() > MAX_POSTCONDITION_ERRORS
    }

    /// Convert to a message group
    pub fn into_message(self) -> Message {
        Message::group(self.entries)
    }
}

/// Compare block 0 on the node with the genesis the case seeded it with.
///
/// Both checks always run; fields absent from the genesis are not checked.
pub async fn verify_preconditions(node: &NodeHandle, genesis: &GenesisSpec) -> Findings {
    let mut findings = Findings::new();

    let first = match node.get_block_by_number(0).await {
        Ok(Some(block)) => block,
        Ok(None) => {
            findings.push("Failed to get first block: node returned no block 0");
            return findings;
        }
        Err(e) => {
            findings.push(format!("Failed to get first block: {}", e));
            return findings;
        }
    };

    if let Some(expected) = genesis.hash() {
        let (found, expected) = (canonicalize(&first.hash), canonicalize(expected));
        if found != expected {
            findings.mismatch("Hash error", found, expected);
        }
    }
    if let Some(expected) = genesis.state_root() {
        let (found, expected) = (canonicalize(&first.state_root), canonicalize(expected));
        if found != expected {
            findings.mismatch("State differs", found, expected);
        }
    }
    findings
}

/// Attribute being checked when an RPC call fails
#[derive(Debug, Clone)]
enum Check {
    Nonce,
    Code,
    Balance,
    Storage(String),
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Nonce => f.write_str("nonce"),
            Check::Code => f.write_str("code"),
            Check::Balance => f.write_str("balance"),
            Check::Storage(slot) => write!(f, "storage ({})", slot),
        }
    }
}

struct Interrupted {
    check: Check,
    address: String,
    error: RpcError,
}

/// Verify the node's state after block import.
///
/// With an expected `last_block_hash` that matches the node's head, nothing
/// else is checked. A mismatching head is recorded and the per-account walk
/// runs for diagnostics. Any recorded entry means failure.
pub async fn verify_postconditions(
    node: &NodeHandle,
    control: &dyn ControlPlane,
    last_block_hash: Option<&str>,
    post_state: &AccountMap,
) -> Findings {
    let mut findings = Findings::new();

    if let Some(expected) = last_block_hash {
        match node.get_latest_block().await {
            Ok(Some(head)) => {
                let found = canonicalize(&head.hash);
                let wanted = canonicalize(expected);
                if low_word(&found) == low_word(&wanted) {
                    return findings;
                }
                findings.mismatch("Last block hash wrong", low_word(&found), low_word(&wanted));
            }
            Ok(None) => findings.push("Last block hash wrong: node returned no head block"),
            Err(e) => findings.push(format!("Last block hash check failed: {}", e)),
        }
    }

    if post_state.len() > LARGE_CHECK {
        control
            .notify(&format!(
                "This may take a while, {} accounts to check postconditions for",
                post_state.len()
            ))
            .await;
    }

    let mut progress = Progress::new(node);
    for (address, expected) in post_state {
        if findings.over_limit() {
            findings.push(ABORT_NOTICE);
            return findings;
        }
        progress.tick(control).await;

        let address = ensure_hex_prefix(address);
        match verify_account(node, control, &address, expected, &mut findings, &mut progress).await {
            Ok(Walk::Continue) => {}
            Ok(Walk::OverLimit) => {
                findings.push(ABORT_NOTICE);
                return findings;
            }
            Err(interrupted) => {
                findings.push(format!(
                    "Postcondition verification failed on {} @ {}: {}",
                    interrupted.check, interrupted.address, interrupted.error
                ));
                return findings;
            }
        }
    }
    findings
}

/// Whether the walk may go on after an account
enum Walk {
    Continue,
    OverLimit,
}

async fn verify_account(
    node: &NodeHandle,
    control: &dyn ControlPlane,
    address: &str,
    expected: &AccountSpec,
    findings: &mut Findings,
    progress: &mut Progress<'_>,
) -> Result<Walk, Interrupted> {
    let interrupted = |check: Check| {
        let address = address.to_string();
        move |error: RpcError| Interrupted {
            check,
            address,
            error,
        }
    };

    if let Some(nonce) = &expected.nonce {
        let found = node.get_nonce(address).await.map_err(interrupted(Check::Nonce))?;
        match parse_hex_u64(nonce) {
            Ok(wanted) if wanted == found => {}
            Ok(wanted) => findings.mismatch(format!("Nonce error (`{}`)", address), found, wanted),
            Err(e) => findings.push(format!("Nonce error (`{}`): {}", address, e)),
        }
    }

    if let Some(code) = &expected.code {
        let found = node.get_code(address).await.map_err(interrupted(Check::Code))?;
        if &found != code {
            findings.mismatch(format!("Code error (`{}`)", address), found, code);
        }
    }

    if let Some(balance) = &expected.balance {
        let found = node.get_balance(address).await.map_err(interrupted(Check::Balance))?;
        match parse_hex_u256(balance) {
            Ok(wanted) if wanted == found => {}
            Ok(wanted) => findings.mismatch(format!("Balance error (`{}`)", address), found, wanted),
            Err(e) => findings.push(format!("Balance error (`{}`): {}", address, e)),
        }
    }

    if let Some(storage) = expected.storage.as_ref().filter(|s| !s.is_empty()) {
        if storage.len() > LARGE_CHECK {
            control
                .notify(&format!(
                    "This may take a while, checking storage for {} keys",
                    storage.len()
                ))
                .await;
        }
        for (slot, value) in storage {
            if findings.over_limit() {
                return Ok(Walk::OverLimit);
            }
            progress.tick(control).await;
            let found = node
                .get_storage_at(address, slot)
                .await
                .map_err(interrupted(Check::Storage(slot.clone())))?;
            match parse_hex_u256(value) {
                Ok(wanted) if wanted == found => {}
                Ok(wanted) => findings.mismatch(
                    format!("Storage error (`{}` @ `{}`)", address, slot),
                    found,
                    wanted,
                ),
                Err(e) => findings.push(format!("Storage error (`{}` @ `{}`): {}", address, slot, e)),
            }
        }
    }
    Ok(Walk::Continue)
}

/// Posts a notice each time another `PROGRESS_INTERVAL` calls have been made
struct Progress<'a> {
    node: &'a NodeHandle,
    start: u64,
    reported: u64,
}

impl<'a> Progress<'a> {
    fn new(node: &'a NodeHandle) -> Self {
        Self {
            node,
            start: node.rpc_count(),
            reported: 0,
        }
    }

    async fn tick(&mut self, control: &dyn ControlPlane) {
        let done = self.node.rpc_count().saturating_sub(self.start);
        let step = done / PROGRESS_INTERVAL;
        if step > self.reported {
            self.reported = step;
            tracing::debug!(node = %self.node.id(), checked = done, "Postcondition progress");
            control
                .notify(&format!("Verifying poststate, have checked {} items ...", done))
                .await;
        }
    }
}

/// Outcome of sending a transaction test's payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Case passed
    Passed,
    /// Case failed with these messages
    Failed(Vec<Message>),
}

/// Send the raw transaction and check the node's verdict
pub async fn verify_transaction(node: &NodeHandle, test: &RawTransactionTest) -> TransactionOutcome {
    let rlp = ensure_hex_prefix(test.rlp.as_deref().unwrap_or_default());
    let sent = node.send_raw_transaction(&rlp).await;

    let returned_hash = match (sent, test.should_succeed()) {
        (Err(_), false) => return TransactionOutcome::Passed,
        (Err(e), true) => {
            return TransactionOutcome::Failed(vec![
                "Execution failed".into(),
                e.to_string().into(),
                Message::group([
                    "Testcase sender".to_string(),
                    test.sender.clone().unwrap_or_default(),
                ]),
            ])
        }
        (Ok(hash), false) => {
            return TransactionOutcome::Failed(vec![
                "Transaction accepted but expected rejection".into(),
                hash.into(),
            ])
        }
        (Ok(hash), true) => hash,
    };

    let mut findings = Findings::new();
    if let Some(expected) = &test.hash {
        let (found, wanted) = (canonicalize(&returned_hash), canonicalize(expected));
        if found != wanted {
            findings.mismatch("Transaction hash mismatch", found, wanted);
        }
    }
    let lookup = test
        .hash
        .as_deref()
        .map(ensure_hex_prefix)
        .unwrap_or_else(|| returned_hash.clone());
    match node.get_transaction_by_hash(&lookup).await {
        Ok(Some(_)) => {}
        Ok(None) => findings.push(format!("Transaction `{}` not found on node", lookup)),
        Err(e) => findings.push(format!("Transaction lookup failed: {}", e)),
    }

    if findings.is_empty() {
        TransactionOutcome::Passed
    } else {
        TransactionOutcome::Failed(vec!["Postcondition check failed".into(), findings.into_message()])
    }
}
