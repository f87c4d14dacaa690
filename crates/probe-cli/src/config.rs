//! Run configuration
//!
//! ```toml
//! simulator_url = "http://127.0.0.1:3000"
//! workers = 8
//! reuse_nodes = false
//!
//! [[collection]]
//! path = "tests/BlockchainTests"
//! kind = "blockchain"
//! excluded_networks = ["Frontier"]
//!
//! [[collection]]
//! path = "tests/TransactionTests"
//! kind = "transaction"
//! ruleset = "Byzantium"
//! ```

use crate::cli::Cli;
use crate::error::CliError;
use probe_control::HttpControlPlaneConfig;
use probe_executor::{CaseFilter, RunOptions, DEFAULT_ARTEFACTS_DIR, DEFAULT_WORKERS, MAX_WORKERS};
use probe_model::{ruleset, CaseKind, RulesetProfile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level run configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Control-plane base URL
    #[serde(default = "default_simulator_url")]
    pub simulator_url: String,
    /// Concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Share nodes between cases with an identical setup
    #[serde(default)]
    pub reuse_nodes: bool,
    /// Directory for genesis and block files
    #[serde(default = "default_artefacts_dir")]
    pub artefacts_dir: PathBuf,
    /// JSON-RPC port on provisioned nodes
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,
    /// Timeout of each node RPC call
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    /// Time budget of one provisioning attempt
    #[serde(default = "default_provision_timeout_secs")]
    pub provision_timeout_secs: u64,
    /// Run every collection once per client type the control plane offers
    #[serde(default)]
    pub fan_out_clients: bool,
    /// Collections to run, in order
    #[serde(default, rename = "collection")]
    pub collections: Vec<CollectionConfig>,
}

/// One test collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Display name; defaults to the path
    #[serde(default)]
    pub name: Option<String>,
    /// Suite file or directory
    pub path: PathBuf,
    /// Fixture format
    #[serde(default = "default_kind")]
    pub kind: CaseKind,
    /// Ruleset forced on every case
    #[serde(default)]
    pub ruleset: Option<String>,
    /// Descend into subdirectories
    #[serde(default = "default_true")]
    pub recursive: bool,
    /// Only run these cases
    #[serde(default)]
    pub whitelist: Vec<String>,
    /// Never run these cases
    #[serde(default)]
    pub blacklist: Vec<String>,
    /// Skip cases declaring these networks
    #[serde(default)]
    pub excluded_networks: Vec<String>,
    /// Index of the first suite file to run, in sorted order
    #[serde(default)]
    pub start: usize,
    /// Number of suite files to run
    #[serde(default)]
    pub limit: Option<usize>,
}

fn default_simulator_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_artefacts_dir() -> PathBuf {
    PathBuf::from(DEFAULT_ARTEFACTS_DIR)
}

fn default_rpc_port() -> u16 {
    8545
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

fn default_provision_timeout_secs() -> u64 {
    300
}

fn default_kind() -> CaseKind {
    CaseKind::Blockchain
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            simulator_url: default_simulator_url(),
            workers: default_workers(),
            reuse_nodes: false,
            artefacts_dir: default_artefacts_dir(),
            rpc_port: default_rpc_port(),
            rpc_timeout_secs: default_rpc_timeout_secs(),
            provision_timeout_secs: default_provision_timeout_secs(),
            fan_out_clients: false,
            collections: Vec::new(),
        }
    }
}

impl CollectionConfig {
    /// Collection over `path` with default settings
    pub fn new(path: impl Into<PathBuf>, kind: CaseKind) -> Self {
        Self {
            name: None,
            path: path.into(),
            kind,
            ruleset: None,
            recursive: true,
            whitelist: Vec::new(),
            blacklist: Vec::new(),
            excluded_networks: Vec::new(),
            start: 0,
            limit: None,
        }
    }

    /// Display name
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Forced ruleset, resolved
    pub fn ruleset_profile(&self) -> Result<Option<&'static RulesetProfile>, CliError> {
        self.ruleset
            .as_deref()
            .map(|name| {
                ruleset::resolve(name)
                    .map_err(|e| CliError::Config(format!("collection {}: {}", self.display_name(), e)))
            })
            .transpose()
    }

    /// Run options for this collection
    pub fn run_options(&self, workers: usize) -> Result<RunOptions, CliError> {
        Ok(RunOptions {
            workers,
            filter: CaseFilter {
                whitelist: self.whitelist.clone(),
                blacklist: self.blacklist.clone(),
                excluded_networks: self.excluded_networks.clone(),
            },
            ruleset_override: self.ruleset_profile()?,
        })
    }
}

impl Config {
    /// Read a config file, or defaults when `path` is `None`
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply command-line overrides
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(url) = &cli.simulator {
            self.simulator_url = url.clone();
        }
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if cli.reuse_nodes {
            self.reuse_nodes = true;
        }
        if let Some(dir) = &cli.artefacts {
            self.artefacts_dir = dir.clone();
        }
        if self.collections.is_empty() {
            self.collections = default_plan();
        }
        for collection in &mut self.collections {
            collection.whitelist.extend(cli.whitelist.iter().cloned());
            collection.blacklist.extend(cli.blacklist.iter().cloned());
        }
    }

    /// Check value ranges and resolve forced rulesets
    pub fn validate(&self) -> Result<(), CliError> {
        if !(1..=MAX_WORKERS).contains(&self.workers) {
            return Err(CliError::Config(format!(
                "workers must be between 1 and {}, got {}",
                MAX_WORKERS, self.workers
            )));
        }
        if self.collections.is_empty() {
            return Err(CliError::Config("no collections to run".to_string()));
        }
        for collection in &self.collections {
            collection.ruleset_profile()?;
        }
        Ok(())
    }

    /// Control-plane connection settings
    pub fn control_plane(&self) -> HttpControlPlaneConfig {
        HttpControlPlaneConfig {
            base_url: self.simulator_url.clone(),
            rpc_port: self.rpc_port,
            rpc_timeout: Duration::from_secs(self.rpc_timeout_secs),
            provision_timeout: Duration::from_secs(self.provision_timeout_secs),
        }
    }
}

/// Collections run when the config names none
pub fn default_plan() -> Vec<CollectionConfig> {
    vec![CollectionConfig::new("./tests/BlockchainTests", CaseKind::Blockchain)]
}
