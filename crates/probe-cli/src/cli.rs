//! CLI argument parsing for chainprobe

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

/// Conformance test driver for blockchain clients
#[derive(Parser, Debug, Clone)]
#[command(name = "chainprobe")]
#[command(about = "Run blockchain conformance suites against client nodes")]
#[command(version)]
pub struct Cli {
    /// Run configuration file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Control-plane base URL
    #[arg(long, env = "HIVE_SIMULATOR")]
    pub simulator: Option<String>,

    /// Concurrent workers (1-16)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Share nodes between cases with an identical setup
    #[arg(long)]
    pub reuse_nodes: bool,

    /// Directory for genesis and block files
    #[arg(long)]
    pub artefacts: Option<PathBuf>,

    /// Write a Markdown report to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Only run these cases (comma-separated, `name` or `suite:name`)
    #[arg(long, value_delimiter = ',')]
    pub whitelist: Vec<String>,

    /// Never run these cases (comma-separated, `name` or `suite:name`)
    #[arg(long, value_delimiter = ',')]
    pub blacklist: Vec<String>,
}
