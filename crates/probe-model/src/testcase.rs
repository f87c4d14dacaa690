//! Test case, the unit of work
//!
//! A `TestCase` owns its raw fixture data, a lazily built genesis and the
//! mutable run state the executor fills in. Status changes are one-way:
//! once a case leaves `Pending` it is never changed again.

use crate::error::ValidationError;
use crate::genesis::GenesisSpec;
use crate::ruleset::{self, RulesetProfile};
use crate::types::{AccountMap, RawBlock, RawBlockTest, RawTransactionTest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Run state of a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    /// Not yet decided
    Pending,
    /// Filtered out, never executed
    Skipped,
    /// All checks passed
    Success,
    /// Validation, provisioning or verification failed
    Failed,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestStatus::Pending => "pending",
            TestStatus::Skipped => "skipped",
            TestStatus::Success => "success",
            TestStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Entry of a case's message list: a line, or a nested group of lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    /// Single line
    Text(String),
    /// Group of related lines (e.g. all postcondition mismatches)
    Group(Vec<Message>),
}

impl Message {
    /// Build a group from anything convertible to messages
    pub fn group<I, M>(items: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Message>,
    {
        Message::Group(items.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Text(text) => f.write_str(text),
            Message::Group(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Message::Text(s)
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Message::Text(s.to_string())
    }
}

impl From<Vec<String>> for Message {
    fn from(items: Vec<String>) -> Self {
        Message::group(items)
    }
}

/// Suite format a case was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseKind {
    /// BlockchainTests: genesis, blocks, expected post-state
    Blockchain,
    /// TransactionTests: one raw transaction
    Transaction,
}

impl fmt::Display for CaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaseKind::Blockchain => f.write_str("blockchain"),
            CaseKind::Transaction => f.write_str("transaction"),
        }
    }
}

/// Fixture body of a case
#[derive(Debug, Clone)]
pub enum Payload {
    /// Blockchain test
    Block(Box<RawBlockTest>),
    /// Transaction test
    Transaction(RawTransactionTest),
    /// Entry that could not be parsed; fails validation
    Malformed(String),
}

/// A single test case
#[derive(Debug)]
pub struct TestCase {
    name: String,
    suite: Arc<str>,
    payload: Payload,
    genesis: OnceLock<GenesisSpec>,
    status: TestStatus,
    messages: Vec<Message>,
    elapsed_ms: Option<u64>,
    node_id: Option<String>,
}

impl TestCase {
    /// Create a pending case
    pub fn new(name: impl Into<String>, suite: Arc<str>, payload: Payload) -> Self {
        Self {
            name: name.into(),
            suite,
            payload,
            genesis: OnceLock::new(),
            status: TestStatus::Pending,
            messages: Vec::new(),
            elapsed_ms: None,
            node_id: None,
        }
    }

    /// Case name within its suite
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning suite
    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// Qualified name used for reporting: `suite:case`
    pub fn full_name(&self) -> String {
        format!("{}:{}", self.suite, self.name)
    }

    /// Fixture body
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Suite format, `None` for unparsable entries
    pub fn kind(&self) -> Option<CaseKind> {
        match self.payload {
            Payload::Block(_) => Some(CaseKind::Blockchain),
            Payload::Transaction(_) => Some(CaseKind::Transaction),
            Payload::Malformed(_) => None,
        }
    }

    /// Blockchain fixture, if this is one
    pub fn block_test(&self) -> Option<&RawBlockTest> {
        match &self.payload {
            Payload::Block(raw) => Some(raw.as_ref()),
            _ => None,
        }
    }

    /// Transaction fixture, if this is one
    pub fn transaction_test(&self) -> Option<&RawTransactionTest> {
        match &self.payload {
            Payload::Transaction(raw) => Some(raw),
            _ => None,
        }
    }

    /// Blocks to import, empty for transaction tests
    pub fn blocks(&self) -> &[RawBlock] {
        self.block_test()
            .and_then(|raw| raw.blocks.as_deref())
            .unwrap_or_default()
    }

    /// Expected post-state, if declared
    pub fn expected_post_state(&self) -> Option<&AccountMap> {
        self.block_test().and_then(|raw| raw.post_state.as_ref())
    }

    /// Expected hash of the chain head, if declared
    pub fn last_block_hash(&self) -> Option<&str> {
        self.block_test().and_then(|raw| raw.last_block_hash.as_deref())
    }

    /// Whether proof-of-work checks must be disabled on the node
    pub fn skip_pow(&self) -> bool {
        self.block_test().map_or(false, RawBlockTest::skip_pow)
    }

    /// Network name declared in the fixture
    pub fn network(&self) -> Option<&str> {
        match &self.payload {
            Payload::Block(raw) => raw.network.as_deref(),
            Payload::Transaction(raw) => raw.network.as_deref(),
            Payload::Malformed(_) => None,
        }
    }

    /// Check required fields and resolve the ruleset profile
    pub fn validate(&self) -> Result<&'static RulesetProfile, ValidationError> {
        match &self.payload {
            Payload::Malformed(reason) => Err(ValidationError::Malformed(reason.clone())),
            Payload::Block(raw) => {
                let missing = raw.missing_keys();
                if !missing.is_empty() {
                    return Err(ValidationError::MissingKeys(missing));
                }
                // missing_keys() guarantees network is present
                ruleset::resolve(raw.network.as_deref().unwrap_or_default())
            }
            Payload::Transaction(raw) => {
                if raw.rlp.is_none() {
                    return Err(ValidationError::MissingKeys(vec!["rlp"]));
                }
                if let Some(network) = raw.network.as_deref() {
                    return ruleset::resolve(network);
                }
                Ok(ruleset::for_block_number(raw.block_number().unwrap_or(0)))
            }
        }
    }

    /// Normalized genesis, built on first use and cached.
    ///
    /// Returns `None` for unparsable entries and for blockchain fixtures
    /// without a genesis header.
    pub fn genesis_spec(&self) -> Option<&GenesisSpec> {
        if let Some(genesis) = self.genesis.get() {
            return Some(genesis);
        }
        let built = match &self.payload {
            Payload::Block(raw) => {
                let header = raw.genesis_block_header.as_ref()?;
                let pre = raw.pre.clone().unwrap_or_default();
                GenesisSpec::build(header, &pre)
            }
            Payload::Transaction(_) => GenesisSpec::transaction_default(),
            Payload::Malformed(_) => return None,
        };
        Some(self.genesis.get_or_init(|| built))
    }

    /// Current status
    pub fn status(&self) -> TestStatus {
        self.status
    }

    /// Whether the case finished successfully
    pub fn is_success(&self) -> bool {
        self.status == TestStatus::Success
    }

    /// Messages recorded so far
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// First message, the one-line error summary
    pub fn top_level_error(&self) -> Option<String> {
        self.messages.first().map(ToString::to_string)
    }

    /// Elapsed run time in milliseconds, if the case was executed
    pub fn elapsed_ms(&self) -> Option<u64> {
        self.elapsed_ms
    }

    /// Record the run time
    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_ms = Some(elapsed.as_millis() as u64);
    }

    /// Id of the node the case ran on
    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    /// Record the node the case runs on
    pub fn set_node_id(&mut self, id: impl Into<String>) {
        self.node_id = Some(id.into());
    }

    /// Mark skipped. Returns false if the case was already decided.
    pub fn skip(&mut self, messages: Vec<Message>) -> bool {
        self.transition(TestStatus::Skipped, messages)
    }

    /// Mark failed. Returns false if the case was already decided.
    pub fn fail(&mut self, messages: Vec<Message>) -> bool {
        self.transition(TestStatus::Failed, messages)
    }

    /// Mark successful. Returns false if the case was already decided.
    pub fn succeed(&mut self) -> bool {
        self.transition(TestStatus::Success, Vec::new())
    }

    fn transition(&mut self, to: TestStatus, messages: Vec<Message>) -> bool {
        if self.status != TestStatus::Pending {
            tracing::warn!(
                case = %self.full_name(),
                from = %self.status,
                to = %to,
                "Ignoring status change of a finished test case"
            );
            return false;
        }
        self.status = to;
        self.messages.extend(messages);
        true
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
