//! # probe-executor
//!
//! Runs conformance test cases against client nodes.
//!
//! ## Features
//!
//! - **Artefacts**: genesis and block files written per case before a node starts
//! - **Node parameters**: never-active baseline, ruleset profile, case and
//!   client overrides layered into one parameter set
//! - **Verification**: genesis preconditions, post-state and chain-head
//!   postconditions, transaction acceptance checks
//! - **Node strategies**: one node per case, or one node shared by
//!   consecutive cases with an identical setup
//! - **Runner**: lazy suite loading, name filters, a bounded worker pool with
//!   per-case panic isolation, and Markdown/summary reporting
//!
//! ## Quick Start
//!
//! ```no_run
//! use probe_control::{HttpControlPlane, HttpControlPlaneConfig};
//! use probe_executor::{ArtefactStore, FreshNodePerTest, RunOptions, Runner, SuiteSource, TestExecutor};
//! use probe_model::CaseKind;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let control = HttpControlPlane::new(HttpControlPlaneConfig::new("http://127.0.0.1:3000"))?;
//! let executor = TestExecutor::new(Arc::new(control), Arc::new(FreshNodePerTest), ArtefactStore::default());
//! let runner = Runner::new(Arc::new(executor), RunOptions::default());
//!
//! let suites = vec![SuiteSource { path: "tests/bcValidBlockTest.json".into(), kind: CaseKind::Blockchain }];
//! let report = runner.run("BlockchainTests", &suites).await;
//! println!("{}", report.to_markdown());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod artefacts;
mod error;
mod executor;
pub mod params;
mod report;
mod run;
mod strategy;
pub mod verify;

pub use artefacts::{ArtefactPaths, ArtefactStore, DEFAULT_ARTEFACTS_DIR};
pub use error::{ArtifactError, ArtifactResult, RunError};
pub use executor::TestExecutor;
pub use report::{CaseOutcome, RunReport, SuiteReport, TestStats};
pub use run::{CaseFilter, RunOptions, Runner, SuiteSource, DEFAULT_WORKERS, MAX_WORKERS};
pub use strategy::{FreshNodePerTest, NodeLease, NodeRequest, NodeStrategy, ReuseByRuleset};
pub use verify::{Findings, TransactionOutcome};
