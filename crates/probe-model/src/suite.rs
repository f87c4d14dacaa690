//! Test suite files
//!
//! A suite file is a JSON object mapping test names to fixtures. Entries are
//! yielded in document order so reports are reproducible.

use crate::error::{ModelError, ModelResult};
use crate::testcase::{CaseKind, Payload, TestCase};
use crate::types::{RawBlockTest, RawTransactionTest};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One parsed suite file
#[derive(Debug)]
pub struct TestSuiteFile {
    path: PathBuf,
    kind: CaseKind,
    name: Arc<str>,
    entries: Map<String, Value>,
}

impl TestSuiteFile {
    /// Read and parse a suite file
    pub fn load(path: impl AsRef<Path>, kind: CaseKind) -> ModelResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(path, &content, kind)
    }

    /// Parse suite content already in memory
    pub fn parse(path: impl AsRef<Path>, content: &str, kind: CaseKind) -> ModelResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match serde_json::from_str::<Value>(content)? {
            Value::Object(map) => map,
            other => {
                return Err(ModelError::MalformedSuite(format!(
                    "{}: expected an object of test cases, found {}",
                    path.display(),
                    json_type(&other)
                )))
            }
        };
        let name = Arc::from(path.display().to_string());
        Ok(Self {
            path,
            kind,
            name,
            entries,
        })
    }

    /// File path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Suite name used in qualified test names
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Suite format
    pub fn kind(&self) -> CaseKind {
        self.kind
    }

    /// Number of test cases
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the suite holds no test cases
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the suite into its test cases, in document order.
    ///
    /// Entries that do not match the fixture shape become `Malformed`
    /// payloads and fail validation later instead of aborting the suite.
    pub fn into_cases(self) -> impl Iterator<Item = TestCase> {
        let kind = self.kind;
        let suite = self.name;
        self.entries.into_iter().map(move |(name, value)| {
            let payload = match kind {
                CaseKind::Blockchain => serde_json::from_value::<RawBlockTest>(value)
                    .map(|raw| Payload::Block(Box::new(raw))),
                CaseKind::Transaction => {
                    serde_json::from_value::<RawTransactionTest>(value).map(Payload::Transaction)
                }
            }
            .unwrap_or_else(|e| Payload::Malformed(e.to_string()));
            TestCase::new(name, Arc::clone(&suite), payload)
        })
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_order() {
        let content = r#"{"zeta": {}, "alpha": {}, "mid": {}}"#;
        let suite = TestSuiteFile::parse("s.json", content, CaseKind::Blockchain).unwrap();
        assert_eq!(suite.len(), 3);
        let names: Vec<_> = suite.into_cases().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_rejects_non_object() {
        let err = TestSuiteFile::parse("s.json", "[1, 2]", CaseKind::Blockchain).unwrap_err();
        assert!(matches!(err, ModelError::MalformedSuite(_)));
        assert!(err.to_string().contains("an array"));
    }

    #[test]
    fn test_malformed_entry() {
        let content = r#"{"bad": {"blocks": 7}, "good": {"blocks": []}}"#;
        let suite = TestSuiteFile::parse("s.json", content, CaseKind::Blockchain).unwrap();
        let cases: Vec<_> = suite.into_cases().collect();
        assert!(matches!(cases[0].payload(), Payload::Malformed(_)));
        assert!(matches!(cases[1].payload(), Payload::Block(_)));
        assert_eq!(cases[1].full_name(), "s.json:good");
    }
}
