//! Sub-result records

use probe_model::{Message, TestCase, TestStatus};
use serde::Serialize;

/// Detail payload of a sub-result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubResultDetails {
    /// Node the case ran on
    pub instanceid: Option<String>,
    /// Full message list
    pub errors: Vec<Message>,
    /// Run time in milliseconds
    pub ms: Option<u64>,
    /// Terminal status
    pub status: TestStatus,
    /// Client implementation, when the run fans out over clients
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

/// One report row per test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubResult {
    /// Qualified test name (`suite:case`)
    pub name: String,
    /// Whether the case succeeded
    pub success: bool,
    /// First message, if any
    pub error: Option<String>,
    /// Detail payload
    pub details: SubResultDetails,
}

impl SubResult {
    /// Build the report row for a finished case
    pub fn from_case(case: &TestCase, client: Option<&str>) -> Self {
        Self {
            name: case.full_name(),
            success: case.is_success(),
            error: case.top_level_error(),
            details: SubResultDetails {
                instanceid: case.node_id().map(str::to_string),
                errors: case.messages().to_vec(),
                ms: case.elapsed_ms(),
                status: case.status(),
                client: client.map(str::to_string),
            },
        }
    }

    /// Details encoded as the JSON string sent to the control plane
    pub fn details_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.details)
    }
}
