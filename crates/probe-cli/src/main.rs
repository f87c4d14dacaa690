//! # probe-cli
//!
//! Command-line driver for chainprobe conformance runs.
//!
//! ## Usage
//!
//! ```bash
//! # Run the default plan (./tests/BlockchainTests) against the simulator
//! HIVE_SIMULATOR=http://127.0.0.1:3000 chainprobe
//!
//! # Run a configured plan with four workers and a Markdown report
//! chainprobe --config run.toml --workers 4 --report report.md
//!
//! # Share nodes between cases with an identical setup
//! chainprobe --config run.toml --reuse-nodes
//! ```
//!
//! The process exits with status 1 when any collection has a failed case.

use anyhow::Context;
use clap::Parser;
use probe_control::{ControlPlane, HttpControlPlane};
use probe_executor::{ArtefactStore, FreshNodePerTest, NodeStrategy, ReuseByRuleset, Runner, TestExecutor};
use std::sync::Arc;

mod cli;
mod config;
mod discovery;
mod error;
mod logging;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Run every configured collection; `Ok(false)` when any case failed
async fn run(cli: Cli) -> anyhow::Result<bool> {
    logging::init(&cli.log_level, cli.log_format)?;

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    config.apply_cli(&cli);
    config.validate()?;

    let mut plan = Vec::with_capacity(config.collections.len());
    for collection in &config.collections {
        let suites = discovery::discover(collection)
            .with_context(|| format!("failed to discover suites of {}", collection.display_name()))?;
        tracing::info!(
            collection = %collection.display_name(),
            suites = suites.len(),
            kind = ?collection.kind,
            "Collection planned"
        );
        plan.push((collection.display_name(), suites, collection.run_options(config.workers)?));
    }

    let control: Arc<dyn ControlPlane> = Arc::new(HttpControlPlane::new(config.control_plane())?);
    let clients: Vec<Option<String>> = if config.fan_out_clients {
        let clients = control
            .list_client_types()
            .await
            .context("failed to list client types")?;
        anyhow::ensure!(!clients.is_empty(), "control plane offers no client types");
        tracing::info!(?clients, "Running against every client type");
        clients.into_iter().map(Some).collect()
    } else {
        vec![None]
    };

    let mut passed = true;
    let mut markdown = Vec::new();
    for client in &clients {
        for (name, suites, options) in &plan {
            let strategy: Arc<dyn NodeStrategy> = if config.reuse_nodes {
                Arc::new(ReuseByRuleset::new())
            } else {
                Arc::new(FreshNodePerTest)
            };
            let executor = TestExecutor::new(
                Arc::clone(&control),
                strategy,
                ArtefactStore::new(&config.artefacts_dir),
            )
            .with_client(client.clone());

            let report = Runner::new(Arc::new(executor), options.clone())
                .run(name, suites)
                .await;
            report.stats().print_summary();
            markdown.push(report.to_markdown());
            if report.has_failures() {
                passed = false;
            }
        }
    }

    if let Some(path) = &cli.report {
        std::fs::write(path, markdown.join("\n"))
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Report written");
    }

    Ok(passed)
}
