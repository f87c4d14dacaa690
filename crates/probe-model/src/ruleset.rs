//! Ruleset table
//!
//! Maps the `network` names used by ethereum/tests to the block number at
//! which each fork activates. A node is configured through one
//! `HIVE_FORK_<NAME>` parameter per fork.

use crate::error::ValidationError;
use std::fmt;

/// Activation block meaning "not active within the range any test reaches"
pub const NEVER_ACTIVE: u64 = 2000;

/// Protocol upgrades a client can be configured with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Fork {
    /// Homestead
    Homestead,
    /// DAO hard fork block
    DaoBlock,
    /// Tangerine Whistle (EIP-150)
    Tangerine,
    /// Spurious Dragon (EIP-155/158)
    Spurious,
    /// Byzantium
    Byzantium,
    /// Constantinople
    Constantinople,
    /// Petersburg (ConstantinopleFix)
    Petersburg,
    /// Istanbul
    Istanbul,
}

impl Fork {
    /// All forks in activation order
    pub const ALL: [Fork; 8] = [
        Fork::Homestead,
        Fork::DaoBlock,
        Fork::Tangerine,
        Fork::Spurious,
        Fork::Byzantium,
        Fork::Constantinople,
        Fork::Petersburg,
        Fork::Istanbul,
    ];

    /// Control-plane parameter carrying this fork's activation block
    pub fn env_key(self) -> &'static str {
        match self {
            Fork::Homestead => "HIVE_FORK_HOMESTEAD",
            Fork::DaoBlock => "HIVE_FORK_DAO_BLOCK",
            Fork::Tangerine => "HIVE_FORK_TANGERINE",
            Fork::Spurious => "HIVE_FORK_SPURIOUS",
            Fork::Byzantium => "HIVE_FORK_BYZANTIUM",
            Fork::Constantinople => "HIVE_FORK_CONSTANTINOPLE",
            Fork::Petersburg => "HIVE_FORK_PETERSBURG",
            Fork::Istanbul => "HIVE_FORK_ISTANBUL",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Fork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Named set of fork activation blocks
#[derive(Debug, PartialEq, Eq)]
pub struct RulesetProfile {
    name: &'static str,
    /// Indexed by `Fork` discriminant
    activations: [u64; 8],
}

impl RulesetProfile {
    const fn new(name: &'static str, activations: [u64; 8]) -> Self {
        Self { name, activations }
    }

    /// Profile name as written in test fixtures
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Activation block of a fork
    pub fn activation(&self, fork: Fork) -> u64 {
        self.activations[fork.index()]
    }

    /// Whether the fork rules apply at `block`
    pub fn is_active_at(&self, fork: Fork, block: u64) -> bool {
        block >= self.activation(fork)
    }

    /// Forks activating strictly after genesis but within the test range
    pub fn transitions(&self) -> Vec<(Fork, u64)> {
        self.forks()
            .filter(|(_, block)| *block != 0 && *block != NEVER_ACTIVE)
            .collect()
    }

    /// All (fork, activation block) pairs
    pub fn forks(&self) -> impl Iterator<Item = (Fork, u64)> + '_ {
        Fork::ALL.iter().map(move |fork| (*fork, self.activation(*fork)))
    }

    /// Control-plane parameters for this profile
    pub fn env(&self) -> Vec<(&'static str, String)> {
        self.forks()
            .map(|(fork, block)| (fork.env_key(), block.to_string()))
            .collect()
    }
}

impl fmt::Display for RulesetProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

const N: u64 = NEVER_ACTIVE;

// Mainnet rows of `RULESETS`
const FRONTIER_ROW: usize = 0;
const HOMESTEAD_ROW: usize = 1;
const EIP150_ROW: usize = 2;
const BYZANTIUM_ROW: usize = 4;

// Columns: Homestead, DaoBlock, Tangerine, Spurious, Byzantium,
//          Constantinople, Petersburg, Istanbul
static RULESETS: &[RulesetProfile] = &[
    RulesetProfile::new("Frontier", [N, N, N, N, N, N, N, N]),
    RulesetProfile::new("Homestead", [0, N, N, N, N, N, N, N]),
    RulesetProfile::new("EIP150", [0, N, 0, N, N, N, N, N]),
    RulesetProfile::new("EIP158", [0, N, 0, 0, N, N, N, N]),
    RulesetProfile::new("Byzantium", [0, N, 0, 0, 0, N, N, N]),
    RulesetProfile::new("Constantinople", [0, N, 0, 0, 0, 0, N, N]),
    RulesetProfile::new("ConstantinopleFix", [0, N, 0, 0, 0, 0, 0, N]),
    RulesetProfile::new("Istanbul", [0, N, 0, 0, 0, 0, 0, 0]),
    RulesetProfile::new("FrontierToHomesteadAt5", [5, N, N, N, N, N, N, N]),
    RulesetProfile::new("HomesteadToEIP150At5", [0, N, 5, N, N, N, N, N]),
    RulesetProfile::new("HomesteadToDaoAt5", [0, 5, N, N, N, N, N, N]),
    RulesetProfile::new("EIP158ToByzantiumAt5", [0, N, 0, 0, 5, N, N, N]),
    RulesetProfile::new("ByzantiumToConstantinopleAt5", [0, N, 0, 0, 0, 5, N, N]),
    RulesetProfile::new("ByzantiumToConstantinopleFixAt5", [0, N, 0, 0, 0, 5, 5, N]),
    RulesetProfile::new("ConstantinopleFixToIstanbulAt5", [0, N, 0, 0, 0, 0, 0, 5]),
];

/// Every profile in table order
pub fn all() -> &'static [RulesetProfile] {
    RULESETS
}

/// Look up a profile by name
pub fn resolve(name: &str) -> Result<&'static RulesetProfile, ValidationError> {
    RULESETS
        .iter()
        .find(|profile| profile.name == name)
        .ok_or_else(|| ValidationError::UnknownNetwork(name.to_string()))
}

/// Profile a mainnet block number falls under.
///
/// Used by transaction fixtures that only carry a `blocknumber`.
pub fn for_block_number(number: u64) -> &'static RulesetProfile {
    let row = if number >= 3_000_000 {
        BYZANTIUM_ROW
    } else if number >= 2_675_000 {
        EIP150_ROW
    } else if number >= 1_000_000 {
        HOMESTEAD_ROW
    } else {
        FRONTIER_ROW
    };
    &RULESETS[row]
}

/// Parameters every node starts from: all forks never active
pub fn never_active_baseline() -> Vec<(&'static str, String)> {
    Fork::ALL
        .iter()
        .map(|fork| (fork.env_key(), NEVER_ACTIVE.to_string()))
        .collect()
}
