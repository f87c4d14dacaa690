//! Collection runs
//!
//! Suites are read one at a time and their cases handed to a bounded worker
//! pool. Filtering and validation happen on the producer side, so only
//! runnable cases ever take a worker slot.

use crate::error::RunError;
use crate::executor::TestExecutor;
use crate::report::{CaseOutcome, RunReport};
use probe_model::{CaseKind, Message, Payload, RulesetProfile, TestCase, TestSuiteFile};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

/// Default number of concurrent workers
pub const DEFAULT_WORKERS: usize = 8;

/// Upper bound on concurrent workers
pub const MAX_WORKERS: usize = 16;

/// Name-based case selection
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    /// Run only these cases (empty means all)
    pub whitelist: Vec<String>,
    /// Never run these cases
    pub blacklist: Vec<String>,
    /// Skip cases declaring one of these networks
    pub excluded_networks: Vec<String>,
}

impl CaseFilter {
    /// Why `case` must be skipped, or `None` if it may run.
    ///
    /// Names match either the bare case name or `suite:name`.
    pub fn skip_reason(&self, case: &TestCase) -> Option<String> {
        let matches = |list: &[String]| {
            let full = case.full_name();
            list.iter().any(|n| n == case.name() || *n == full)
        };

        if !self.whitelist.is_empty() && !matches(&self.whitelist) {
            return Some("Testcase not in whitelist".to_string());
        }
        if matches(&self.blacklist) {
            return Some("Testcase in blacklist".to_string());
        }
        if let Some(network) = case.network() {
            if self.excluded_networks.iter().any(|n| n == network) {
                return Some(format!("Network `{}` excluded from this run", network));
            }
        }
        None
    }
}

/// A suite file to run
#[derive(Debug, Clone)]
pub struct SuiteSource {
    /// File path
    pub path: PathBuf,
    /// Fixture format
    pub kind: CaseKind,
}

/// Run settings
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Concurrent workers, clamped to `1..=MAX_WORKERS`
    pub workers: usize,
    /// Case selection
    pub filter: CaseFilter,
    /// Profile forced on every case instead of its declared network
    pub ruleset_override: Option<&'static RulesetProfile>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            filter: CaseFilter::default(),
            ruleset_override: None,
        }
    }
}

/// Drives a collection of suites through a `TestExecutor`
pub struct Runner {
    executor: Arc<TestExecutor>,
    options: RunOptions,
}

impl Runner {
    /// Create a runner
    pub fn new(executor: Arc<TestExecutor>, options: RunOptions) -> Self {
        Self { executor, options }
    }

    /// Effective worker count
    pub fn workers(&self) -> usize {
        self.options.workers.clamp(1, MAX_WORKERS)
    }

    /// Run every case of every suite and collect the outcomes
    pub async fn run(&self, collection: &str, suites: &[SuiteSource]) -> RunReport {
        let started = Instant::now();
        let control = self.executor.control();
        let semaphore = Arc::new(Semaphore::new(self.workers()));
        let mut tasks = JoinSet::new();
        let mut outcomes = Vec::new();
        let mut seq = 0usize;

        tracing::info!(collection, suites = suites.len(), workers = self.workers(), "Starting run");

        for (index, source) in suites.iter().enumerate() {
            let suite = match TestSuiteFile::load(&source.path, source.kind) {
                Ok(suite) => suite,
                Err(source_err) => {
                    let err = RunError::Suite {
                        path: source.path.clone(),
                        source: source_err,
                    };
                    tracing::error!(error = %err, "Skipping suite");
                    control.notify(&err.to_string()).await;
                    continue;
                }
            };
            control
                .notify(&format!("Commencing testfile [{}] ({})", index + 1, suite.name()))
                .await;

            for mut case in suite.into_cases() {
                seq += 1;

                if let Some(reason) = self.options.filter.skip_reason(&case) {
                    case.skip(vec![reason.into()]);
                    self.executor.finish(&case).await;
                    outcomes.push(CaseOutcome::from_case(seq, &case));
                    continue;
                }

                let profile = match case.validate() {
                    Ok(profile) => self.options.ruleset_override.unwrap_or(profile),
                    Err(e) => {
                        case.fail(vec![
                            "Testcase failed initial validation".into(),
                            e.to_string().into(),
                        ]);
                        self.executor.finish(&case).await;
                        outcomes.push(CaseOutcome::from_case(seq, &case));
                        continue;
                    }
                };

                let permit = match Arc::clone(&semaphore).acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };
                tasks.spawn(run_isolated(
                    Arc::clone(&self.executor),
                    case,
                    profile,
                    permit,
                    seq,
                ));

                // drain finished tasks
                while let Some(joined) = tasks.try_join_next() {
                    collect(joined, &mut outcomes);
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            collect(joined, &mut outcomes);
        }
        self.executor.shutdown().await;

        let report = RunReport::new(
            collection,
            self.executor.client().map(str::to_string),
            outcomes,
            started.elapsed(),
        );
        report.log_summary();
        report
    }
}

fn collect(joined: Result<CaseOutcome, tokio::task::JoinError>, outcomes: &mut Vec<CaseOutcome>) {
    match joined {
        Ok(outcome) => outcomes.push(outcome),
        Err(e) => tracing::error!(error = %RunError::Worker(e.to_string()), "Worker lost"),
    }
}

/// Execute one case on its own task so a panic only fails that case
async fn run_isolated(
    executor: Arc<TestExecutor>,
    case: TestCase,
    profile: &'static RulesetProfile,
    permit: OwnedSemaphorePermit,
    seq: usize,
) -> CaseOutcome {
    let _permit = permit;
    let name = case.name().to_string();
    let suite: Arc<str> = Arc::from(case.suite());

    let worker = Arc::clone(&executor);
    let inner = tokio::spawn(async move {
        let mut case = case;
        worker.execute(&mut case, profile).await;
        case
    });

    match inner.await {
        Ok(case) => CaseOutcome::from_case(seq, &case),
        Err(e) => {
            tracing::error!(test = %format!("{}:{}", suite, name), error = %e, "Test execution aborted");
            let mut case = TestCase::new(name, suite, Payload::Malformed(String::new()));
            case.fail(vec![
                "Test execution aborted".into(),
                Message::from(e.to_string()),
            ]);
            executor.finish(&case).await;
            CaseOutcome::from_case(seq, &case)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use probe_model::RawTransactionTest;

    fn case(name: &str, network: Option<&str>) -> TestCase {
        TestCase::new(
            name,
            Arc::from("suite.json"),
            Payload::Transaction(RawTransactionTest {
                rlp: Some("0x00".into()),
                network: network.map(str::to_string),
                ..Default::default()
            }),
        )
    }

    #[test]
    fn test_empty_filter_runs_everything() {
        assert!(CaseFilter::default().skip_reason(&case("a", None)).is_none());
    }

    #[test]
    fn test_whitelist() {
        let filter = CaseFilter {
            whitelist: vec!["suite.json:a".into(), "b".into()],
            ..Default::default()
        };
        assert!(filter.skip_reason(&case("a", None)).is_none());
        assert!(filter.skip_reason(&case("b", None)).is_none());
        assert_eq!(
            filter.skip_reason(&case("c", None)).as_deref(),
            Some("Testcase not in whitelist")
        );
    }

    #[test]
    fn test_blacklist_wins_over_whitelist() {
        let filter = CaseFilter {
            whitelist: vec!["a".into()],
            blacklist: vec!["a".into()],
            ..Default::default()
        };
        assert_eq!(
            filter.skip_reason(&case("a", None)).as_deref(),
            Some("Testcase in blacklist")
        );
    }

    #[test]
    fn test_excluded_network() {
        let filter = CaseFilter {
            excluded_networks: vec!["Frontier".into()],
            ..Default::default()
        };
        assert_eq!(
            filter.skip_reason(&case("a", Some("Frontier"))).as_deref(),
            Some("Network `Frontier` excluded from this run")
        );
        assert!(filter.skip_reason(&case("a", Some("Homestead"))).is_none());
    }

    #[test]
    fn test_worker_clamp() {
        use crate::{ArtefactStore, FreshNodePerTest};
        use probe_control::MockControlPlane;

        let executor = Arc::new(TestExecutor::new(
            Arc::new(MockControlPlane::new()),
            Arc::new(FreshNodePerTest),
            ArtefactStore::default(),
        ));
        let runner = |workers| {
            Runner::new(
                Arc::clone(&executor),
                RunOptions {
                    workers,
                    ..Default::default()
                },
            )
        };
        assert_eq!(runner(0).workers(), 1);
        assert_eq!(runner(8).workers(), 8);
        assert_eq!(runner(64).workers(), MAX_WORKERS);
    }
}
