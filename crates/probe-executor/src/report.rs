//! Run results and summaries

use probe_model::{Message, TestCase, TestStatus};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;

/// Final record of one case
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    /// Position in production order
    pub seq: usize,
    /// Suite name
    pub suite: String,
    /// Case name
    pub name: String,
    /// Terminal status
    pub status: TestStatus,
    /// Messages recorded on the case
    pub messages: Vec<Message>,
    /// Node the case ran on
    pub node_id: Option<String>,
    /// Elapsed run time
    pub elapsed_ms: Option<u64>,
}

impl CaseOutcome {
    /// Snapshot a finished case
    pub fn from_case(seq: usize, case: &TestCase) -> Self {
        Self {
            seq,
            suite: case.suite().to_string(),
            name: case.name().to_string(),
            status: case.status(),
            messages: case.messages().to_vec(),
            node_id: case.node_id().map(str::to_string),
            elapsed_ms: case.elapsed_ms(),
        }
    }

    fn summary(&self) -> String {
        self.messages
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(": ")
    }
}

/// Counters over a set of outcomes
#[derive(Debug, Default, Clone)]
pub struct TestStats {
    /// Total cases
    pub total: usize,
    /// Succeeded
    pub passed: usize,
    /// Failed
    pub failed: usize,
    /// Skipped
    pub skipped: usize,
    /// Wall time
    pub duration: Duration,
    /// Failed case names with their summary
    pub failures: Vec<(String, String)>,
}

impl TestStats {
    /// Record one outcome
    pub fn record(&mut self, outcome: &CaseOutcome) {
        self.total += 1;
        match outcome.status {
            TestStatus::Success => self.passed += 1,
            TestStatus::Skipped => self.skipped += 1,
            TestStatus::Failed | TestStatus::Pending => {
                self.failed += 1;
                self.failures.push((
                    format!("{}:{}", outcome.suite, outcome.name),
                    outcome.summary(),
                ));
            }
        }
    }

    /// Pass rate over executed (non-skipped) cases, in percent
    pub fn pass_rate(&self) -> f64 {
        let executed = self.total - self.skipped;
        if executed == 0 {
            0.0
        } else {
            (self.passed as f64 / executed as f64) * 100.0
        }
    }

    /// Print a summary to stdout
    pub fn print_summary(&self) {
        println!("\n========================================");
        println!("Test Results Summary");
        println!("========================================");
        println!("Total:   {}", self.total);
        println!("Passed:  {} ({:.1}%)", self.passed, self.pass_rate());
        println!("Failed:  {}", self.failed);
        println!("Skipped: {}", self.skipped);
        println!("Duration: {:?}", self.duration);

        if !self.failures.is_empty() {
            println!("\n----------------------------------------");
            println!("Failures (first 20):");
            println!("----------------------------------------");
            for (name, error) in self.failures.iter().take(20) {
                println!("  {} - {}", name, error);
            }
            if self.failures.len() > 20 {
                println!("  ... and {} more", self.failures.len() - 20);
            }
        }
        println!("========================================\n");
    }
}

/// Outcomes of one suite file
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    /// Suite name
    pub suite: String,
    /// Outcomes in production order
    pub cases: Vec<CaseOutcome>,
}

impl SuiteReport {
    /// Count cases with a given status
    pub fn count(&self, status: TestStatus) -> usize {
        self.cases.iter().filter(|c| c.status == status).count()
    }

    /// Whether any case failed
    pub fn has_failures(&self) -> bool {
        self.cases.iter().any(|c| c.status != TestStatus::Success && c.status != TestStatus::Skipped)
    }
}

/// Outcomes of one collection run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Collection name
    pub collection: String,
    /// Client implementation, if pinned
    pub client: Option<String>,
    /// Per-suite outcomes, in the order suites were processed
    pub suites: Vec<SuiteReport>,
    /// Wall time of the run
    #[serde(skip)]
    pub duration: Duration,
}

impl RunReport {
    /// Group outcomes by suite, ordering by production sequence
    pub fn new(
        collection: impl Into<String>,
        client: Option<String>,
        mut outcomes: Vec<CaseOutcome>,
        duration: Duration,
    ) -> Self {
        outcomes.sort_by_key(|o| o.seq);
        let mut suites: Vec<SuiteReport> = Vec::new();
        for outcome in outcomes {
            match suites.last_mut() {
                Some(last) if last.suite == outcome.suite => last.cases.push(outcome),
                _ => suites.push(SuiteReport {
                    suite: outcome.suite.clone(),
                    cases: vec![outcome],
                }),
            }
        }
        Self {
            collection: collection.into(),
            client,
            suites,
            duration,
        }
    }

    /// Aggregate counters
    pub fn stats(&self) -> TestStats {
        let mut stats = TestStats {
            duration: self.duration,
            ..Default::default()
        };
        for outcome in self.suites.iter().flat_map(|s| &s.cases) {
            stats.record(outcome);
        }
        stats
    }

    /// Whether the run counts as failed
    pub fn has_failures(&self) -> bool {
        self.suites.iter().any(SuiteReport::has_failures)
    }

    /// Log one line per suite and a total
    pub fn log_summary(&self) {
        for suite in &self.suites {
            tracing::info!(
                collection = %self.collection,
                suite = %suite.suite,
                success = suite.count(TestStatus::Success),
                failed = suite.count(TestStatus::Failed),
                skipped = suite.count(TestStatus::Skipped),
                "Suite finished"
            );
        }
        let stats = self.stats();
        tracing::info!(
            collection = %self.collection,
            total = stats.total,
            passed = stats.passed,
            failed = stats.failed,
            skipped = stats.skipped,
            duration = ?stats.duration,
            "Collection finished"
        );
    }

    /// Markdown rendering of the run
    pub fn to_markdown(&self) -> String {
        let stats = self.stats();
        let mut out = String::new();
        let _ = writeln!(out, "# {}", self.collection);
        if let Some(client) = &self.client {
            let _ = writeln!(out, "\nClient: `{}`", client);
        }
        let _ = writeln!(
            out,
            "\n{} tests, {} passed, {} failed, {} skipped ({:.1}% pass rate)",
            stats.total,
            stats.passed,
            stats.failed,
            stats.skipped,
            stats.pass_rate()
        );

        let _ = writeln!(out, "\n| Suite | Success | Failed | Skipped |");
        let _ = writeln!(out, "|---|---|---|---|");
        for suite in &self.suites {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                suite.suite,
                suite.count(TestStatus::Success),
                suite.count(TestStatus::Failed),
                suite.count(TestStatus::Skipped)
            );
        }

        for (title, status) in [
            ("Failed", TestStatus::Failed),
            ("Skipped", TestStatus::Skipped),
            ("Success", TestStatus::Success),
        ] {
            let cases: Vec<&CaseOutcome> = self
                .suites
                .iter()
                .flat_map(|s| &s.cases)
                .filter(|c| c.status == status)
                .collect();
            if cases.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n## {}\n", title);
            for case in cases {
                let _ = write!(out, "- `{}:{}`", case.suite, case.name);
                if let Some(node) = &case.node_id {
                    let _ = write!(out, " on `{}`", node);
                }
                if let Some(ms) = case.elapsed_ms {
                    let _ = write!(out, " ({} ms)", ms);
                }
                if status != TestStatus::Success && !case.messages.is_empty() {
                    let _ = write!(out, ": {}", case.summary());
                }
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(seq: usize, suite: &str, status: TestStatus, messages: &[&str]) -> CaseOutcome {
        CaseOutcome {
            seq,
            suite: suite.to_string(),
            name: format!("case{}", seq),
            status,
            messages: messages.iter().map(|m| Message::from(*m)).collect(),
            node_id: None,
            elapsed_ms: None,
        }
    }

    #[test]
    fn test_groups_by_suite_in_sequence_order() {
        let report = RunReport::new(
            "c",
            None,
            vec![
                outcome(3, "b", TestStatus::Success, &[]),
                outcome(1, "a", TestStatus::Success, &[]),
                outcome(2, "a", TestStatus::Failed, &["x"]),
            ],
            Duration::ZERO,
        );
        assert_eq!(report.suites.len(), 2);
        assert_eq!(report.suites[0].suite, "a");
        assert_eq!(report.suites[0].cases[0].seq, 1);
        assert_eq!(report.suites[0].cases[1].seq, 2);
        assert!(report.has_failures());
    }

    #[test]
    fn test_skipped_does_not_fail_run() {
        let report = RunReport::new(
            "c",
            None,
            vec![
                outcome(1, "a", TestStatus::Success, &[]),
                outcome(2, "a", TestStatus::Skipped, &["Testcase in blacklist"]),
            ],
            Duration::ZERO,
        );
        assert!(!report.has_failures());
        let stats = report.stats();
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.pass_rate(), 100.0);
    }

    #[test]
    fn test_stats_failures() {
        let mut stats = TestStats::default();
        stats.record(&outcome(1, "s", TestStatus::Failed, &["Preconditions failed", "Hash error"]));
        assert_eq!(stats.failed, 1);
        assert_eq!(
            stats.failures[0],
            ("s:case1".to_string(), "Preconditions failed: Hash error".to_string())
        );
        assert_eq!(stats.pass_rate(), 0.0);
    }

    #[test]
    fn test_markdown() {
        let report = RunReport::new(
            "BlockchainTests",
            Some("geth".into()),
            vec![
                outcome(1, "a.json", TestStatus::Failed, &["Postcondition check failed"]),
                outcome(2, "a.json", TestStatus::Success, &[]),
            ],
            Duration::ZERO,
        );
        let md = report.to_markdown();
        assert!(md.starts_with("# BlockchainTests"));
        assert!(md.contains("Client: `geth`"));
        assert!(md.contains("| a.json | 1 | 1 | 0 |"));
        assert!(md.contains("## Failed\n\n- `a.json:case1`: Postcondition check failed"));
        assert!(md.contains("## Success\n\n- `a.json:case2`\n"));
        assert!(!md.contains("## Skipped"));
    }
}
