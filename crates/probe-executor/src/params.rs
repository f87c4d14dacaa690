//! Node parameter assembly
//!
//! Parameters are merged in order, later layers overriding earlier ones:
//! never-active baseline, ruleset profile, case overrides, client selection,
//! then the artefact paths.

use crate::artefacts::ArtefactPaths;
use probe_control::NodeParams;
use probe_model::{ruleset, GenesisSpec, RulesetProfile};

/// Path of the genesis file
pub const INIT_GENESIS: &str = "HIVE_INIT_GENESIS";
/// Path of the block directory
pub const INIT_BLOCKS: &str = "HIVE_INIT_BLOCKS";
/// Disable proof-of-work verification
pub const SKIP_POW: &str = "HIVE_SKIP_POW";
/// Client implementation to start
pub const CLIENT: &str = "CLIENT";

/// Parameters every node receives regardless of profile
pub fn baseline() -> NodeParams {
    let mut params = NodeParams::new();
    params
        .extend(ruleset::never_active_baseline())
        .set("HIVE_FORK_DAO_VOTE", "1")
        .set("HIVE_CHAIN_ID", "1");
    params
}

/// Ruleset-derived parameters for a case, without artefact paths
pub fn ruleset_params(profile: &RulesetProfile, skip_pow: bool, client: Option<&str>) -> NodeParams {
    let mut params = baseline();
    params.extend(profile.env());
    if skip_pow {
        params.set(SKIP_POW, "1");
    }
    if let Some(client) = client {
        params.set(CLIENT, client);
    }
    params
}

/// Add the artefact paths
pub fn with_artefacts(mut params: NodeParams, paths: &ArtefactPaths) -> NodeParams {
    params.set(INIT_GENESIS, paths.genesis.display().to_string());
    if let Some(blocks) = &paths.blocks {
        params.set(INIT_BLOCKS, blocks.display().to_string());
    }
    params
}

/// Key under which a running node may serve another case.
///
/// Only cases that import no blocks can share a node, and only with cases
/// seeded from an identical genesis under identical parameters.
pub fn reuse_key(ruleset: &NodeParams, genesis: &GenesisSpec, block_count: usize) -> Option<String> {
    if block_count > 0 {
        return None;
    }
    let genesis = serde_json::to_string(genesis).ok()?;
    Some(format!("{}|{}", ruleset, genesis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_baseline_never_activates() {
        let params = baseline();
        assert_eq!(params.get("HIVE_FORK_HOMESTEAD"), Some("2000"));
        assert_eq!(params.get("HIVE_FORK_ISTANBUL"), Some("2000"));
        assert_eq!(params.get("HIVE_FORK_DAO_VOTE"), Some("1"));
        assert_eq!(params.get("HIVE_CHAIN_ID"), Some("1"));
    }

    #[test]
    fn test_profile_overrides_baseline() {
        let profile = ruleset::resolve("EIP158ToByzantiumAt5").unwrap();
        let params = ruleset_params(profile, true, Some("geth"));
        assert_eq!(params.get("HIVE_FORK_HOMESTEAD"), Some("0"));
        assert_eq!(params.get("HIVE_FORK_BYZANTIUM"), Some("5"));
        assert_eq!(params.get("HIVE_FORK_CONSTANTINOPLE"), Some("2000"));
        assert_eq!(params.get(SKIP_POW), Some("1"));
        assert_eq!(params.get(CLIENT), Some("geth"));
    }

    #[test]
    fn test_skip_pow_absent_by_default() {
        let profile = ruleset::resolve("Frontier").unwrap();
        assert!(ruleset_params(profile, false, None).get(SKIP_POW).is_none());
    }

    #[test]
    fn test_with_artefacts() {
        let profile = ruleset::resolve("Frontier").unwrap();
        let paths = ArtefactPaths {
            genesis: PathBuf::from("/a/genesis.json"),
            blocks: None,
        };
        let params = with_artefacts(ruleset_params(profile, false, None), &paths);
        assert_eq!(params.get(INIT_GENESIS), Some("/a/genesis.json"));
        assert!(params.get(INIT_BLOCKS).is_none());
    }

    #[test]
    fn test_reuse_key() {
        let genesis = GenesisSpec::transaction_default();
        let frontier = ruleset_params(ruleset::resolve("Frontier").unwrap(), false, None);
        let homestead = ruleset_params(ruleset::resolve("Homestead").unwrap(), false, None);

        assert!(reuse_key(&frontier, &genesis, 1).is_none());
        assert_eq!(
            reuse_key(&frontier, &genesis, 0),
            reuse_key(&frontier.clone(), &genesis, 0)
        );
        assert_ne!(
            reuse_key(&frontier, &genesis, 0),
            reuse_key(&homestead, &genesis, 0)
        );
    }
}
