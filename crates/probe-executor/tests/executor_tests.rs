//! End-to-end runs against the mock control plane

use probe_control::{MockControlPlane, NodeParams};
use probe_executor::{
    ArtefactStore, CaseFilter, FreshNodePerTest, NodeStrategy, ReuseByRuleset, RunOptions, Runner,
    SuiteSource, TestExecutor,
};
use probe_model::{ruleset, CaseKind, TestStatus};
use probe_rpc::transport::MOCK_BLOCK_HASH;
use probe_rpc::MockTransport;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn write_suite(dir: &Path, name: &str, content: &Value) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(content).unwrap()).unwrap();
    path
}

fn accepted_tx(network: &str) -> Value {
    json!({
        "rlp": "0xf86103018207d094",
        "sender": "0x0f65fe9276bc9a24ae7083ae28e2660ef72df99e",
        "hash": MOCK_BLOCK_HASH.trim_start_matches("0x"),
        "network": network
    })
}

fn tx_node() -> MockTransport {
    let transport = MockTransport::new();
    transport.set_response("eth_getTransactionByHash", json!({"hash": MOCK_BLOCK_HASH}));
    transport
}

fn stale_tx_node() -> MockTransport {
    let transport = MockTransport::new();
    transport.set_response("eth_getTransactionByHash", Value::Null);
    transport
}

/// Numeric suffix of the case a node was requested for, read from its
/// genesis path
fn case_index(params: &NodeParams) -> Option<usize> {
    let genesis = Path::new(params.get("HIVE_INIT_GENESIS")?);
    let case = genesis.parent()?.file_name()?.to_str()?;
    case.strip_prefix("tx")?.parse().ok()
}

fn runner(
    control: Arc<MockControlPlane>,
    strategy: Arc<dyn NodeStrategy>,
    artefacts: &TempDir,
    options: RunOptions,
) -> Runner {
    let executor = TestExecutor::new(control, strategy, ArtefactStore::new(artefacts.path()));
    Runner::new(Arc::new(executor), options)
}

// ==================== Worker Pool Tests ====================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bounded_concurrency() {
    let fixtures = TempDir::new().unwrap();
    let artefacts = TempDir::new().unwrap();

    let mut cases = serde_json::Map::new();
    for i in 0..12 {
        cases.insert(format!("tx{:02}", i), accepted_tx("Byzantium"));
    }
    let path = write_suite(fixtures.path(), "ttSignature.json", &Value::Object(cases));

    // every third case gets a node that cannot find the transaction
    let control = Arc::new(
        MockControlPlane::with_factory(|params| match case_index(params) {
            Some(i) if i % 3 == 0 => stale_tx_node(),
            _ => tx_node(),
        })
        .with_provision_delay(Duration::from_millis(20)),
    );
    let runner = runner(
        Arc::clone(&control),
        Arc::new(FreshNodePerTest),
        &artefacts,
        RunOptions {
            workers: 3,
            ..Default::default()
        },
    );

    let report = runner
        .run("TransactionTests", &[SuiteSource { path, kind: CaseKind::Transaction }])
        .await;

    let stats = report.stats();
    assert_eq!(stats.total, 12);
    assert_eq!(stats.passed, 8, "{:?}", stats.failures);
    assert_eq!(stats.failed, 4);
    assert!(report.has_failures());

    assert!(control.peak_live_nodes() <= 3);
    assert_eq!(control.live_nodes(), 0);

    let mut node_ids: Vec<_> = report.suites[0]
        .cases
        .iter()
        .map(|c| c.node_id.clone().unwrap())
        .collect();
    node_ids.sort();
    node_ids.dedup();
    assert_eq!(node_ids.len(), 12);

    // outcomes come back in document order regardless of completion order
    let names: Vec<_> = report.suites[0].cases.iter().map(|c| c.name.clone()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    // one sub-result per case, each carrying its own verdict
    let subresults = control.subresults();
    assert_eq!(subresults.len(), 12);
    for i in 0..12 {
        let name = format!("tx{:02}", i);
        let matching: Vec<_> = subresults.iter().filter(|r| r.name.ends_with(&name)).collect();
        assert_eq!(matching.len(), 1, "{}", name);
        assert_eq!(matching[0].success, i % 3 != 0, "{}", name);
    }
}

#[tokio::test]
async fn test_reuse_shares_node_for_identical_setup() {
    let fixtures = TempDir::new().unwrap();
    let artefacts = TempDir::new().unwrap();
    let path = write_suite(
        fixtures.path(),
        "tt.json",
        &json!({
            "a": accepted_tx("Homestead"),
            "b": accepted_tx("Homestead"),
            "c": accepted_tx("Homestead"),
            "d": accepted_tx("Byzantium"),
        }),
    );

    let control = Arc::new(MockControlPlane::with_factory(|_| tx_node()));
    let runner = runner(
        Arc::clone(&control),
        Arc::new(ReuseByRuleset::new()),
        &artefacts,
        RunOptions {
            workers: 1,
            ..Default::default()
        },
    );
    let report = runner
        .run("TransactionTests", &[SuiteSource { path, kind: CaseKind::Transaction }])
        .await;

    assert_eq!(report.stats().passed, 4);
    assert_eq!(control.created().len(), 2);
    assert_eq!(control.killed().len(), 2);
    assert_eq!(control.live_nodes(), 0);

    let nodes: Vec<_> = report.suites[0]
        .cases
        .iter()
        .map(|c| c.node_id.clone().unwrap())
        .collect();
    assert_eq!(nodes[0], nodes[1]);
    assert_eq!(nodes[1], nodes[2]);
    assert_ne!(nodes[2], nodes[3]);
}

// ==================== Filtering and Validation Tests ====================

#[tokio::test]
async fn test_skipped_and_invalid_cases_are_reported() {
    let fixtures = TempDir::new().unwrap();
    let artefacts = TempDir::new().unwrap();
    let path = write_suite(
        fixtures.path(),
        "bc.json",
        &json!({
            "blacklisted": {"pre": {}, "blocks": [], "postState": {}, "genesisBlockHeader": {}, "network": "Frontier"},
            "incomplete": {"pre": {}, "blocks": []},
            "unknownNetwork": {"pre": {}, "blocks": [], "postState": {}, "genesisBlockHeader": {}, "network": "Nope"},
            "excluded": {"pre": {}, "blocks": [], "postState": {}, "genesisBlockHeader": {}, "network": "Homestead"}
        }),
    );

    let control = Arc::new(MockControlPlane::new());
    let runner = runner(
        Arc::clone(&control),
        Arc::new(FreshNodePerTest),
        &artefacts,
        RunOptions {
            filter: CaseFilter {
                blacklist: vec!["blacklisted".into()],
                excluded_networks: vec!["Homestead".into()],
                ..Default::default()
            },
            ..Default::default()
        },
    );
    let report = runner
        .run("BlockchainTests", &[SuiteSource { path, kind: CaseKind::Blockchain }])
        .await;

    let cases = &report.suites[0].cases;
    assert_eq!(cases.len(), 4);
    assert_eq!(cases[0].status, TestStatus::Skipped);
    assert_eq!(cases[0].messages[0].to_string(), "Testcase in blacklist");
    assert_eq!(cases[1].status, TestStatus::Failed);
    assert_eq!(cases[1].messages[0].to_string(), "Testcase failed initial validation");
    assert_eq!(
        cases[1].messages[1].to_string(),
        "Missing keys: postState,genesisBlockHeader,network"
    );
    assert_eq!(
        cases[2].messages[1].to_string(),
        "Network `Nope` not defined in ruleset"
    );
    assert_eq!(cases[3].status, TestStatus::Skipped);

    // nothing runnable, so no node was ever requested
    assert_eq!(control.attempts(), 0);
    assert_eq!(control.subresults().len(), 4);
    assert!(report.has_failures());
}

#[tokio::test]
async fn test_unreadable_suite_does_not_stop_the_run() {
    let fixtures = TempDir::new().unwrap();
    let artefacts = TempDir::new().unwrap();
    let good = write_suite(fixtures.path(), "good.json", &json!({"a": accepted_tx("Frontier")}));
    std::fs::write(fixtures.path().join("bad.json"), "{ not json").unwrap();

    let control = Arc::new(MockControlPlane::with_factory(|_| tx_node()));
    let runner = runner(
        Arc::clone(&control),
        Arc::new(FreshNodePerTest),
        &artefacts,
        RunOptions::default(),
    );
    let report = runner
        .run(
            "TransactionTests",
            &[
                SuiteSource {
                    path: fixtures.path().join("bad.json"),
                    kind: CaseKind::Transaction,
                },
                SuiteSource {
                    path: good,
                    kind: CaseKind::Transaction,
                },
                SuiteSource {
                    path: fixtures.path().join("missing.json"),
                    kind: CaseKind::Transaction,
                },
            ],
        )
        .await;

    assert_eq!(report.stats().total, 1);
    assert_eq!(report.stats().passed, 1);
    assert!(control
        .logs()
        .iter()
        .any(|l| l.starts_with("Commencing testfile [2]")));
}

// ==================== Verification Tests ====================

#[tokio::test]
async fn test_transaction_verdicts() {
    let fixtures = TempDir::new().unwrap();
    let artefacts = TempDir::new().unwrap();
    let path = write_suite(
        fixtures.path(),
        "tt.json",
        &json!({
            "valid": accepted_tx("Frontier"),
            "invalid": {"rlp": "0xdeadbeef", "network": "Frontier"},
            "invalidByBlock": {"rlp": "0xdeadbeef", "blocknumber": "3000000"}
        }),
    );

    // the mock accepts every payload, so expected rejections fail
    let control = Arc::new(MockControlPlane::with_factory(|_| tx_node()));
    let runner = runner(
        Arc::clone(&control),
        Arc::new(FreshNodePerTest),
        &artefacts,
        RunOptions {
            workers: 1,
            ..Default::default()
        },
    );
    let report = runner
        .run("TransactionTests", &[SuiteSource { path, kind: CaseKind::Transaction }])
        .await;

    let cases = &report.suites[0].cases;
    assert_eq!(cases[0].status, TestStatus::Success);
    assert_eq!(cases[1].status, TestStatus::Failed);
    assert_eq!(
        cases[1].messages[0].to_string(),
        "Transaction accepted but expected rejection"
    );

    // blocknumber 3000000 selects Byzantium
    let byzantium = ruleset::resolve("Byzantium").unwrap();
    let (_, params) = &control.created()[2];
    for (key, value) in byzantium.env() {
        assert_eq!(params.get(key), Some(value.as_str()));
    }
}

#[tokio::test]
async fn test_ruleset_override() {
    let fixtures = TempDir::new().unwrap();
    let artefacts = TempDir::new().unwrap();
    let path = write_suite(fixtures.path(), "tt.json", &json!({"a": accepted_tx("Frontier")}));

    let control = Arc::new(MockControlPlane::with_factory(|_| tx_node()));
    let runner = runner(
        Arc::clone(&control),
        Arc::new(FreshNodePerTest),
        &artefacts,
        RunOptions {
            ruleset_override: Some(ruleset::resolve("Constantinople").unwrap()),
            ..Default::default()
        },
    );
    runner
        .run("TransactionTests", &[SuiteSource { path, kind: CaseKind::Transaction }])
        .await;

    let (_, params) = &control.created()[0];
    assert_eq!(params.get("HIVE_FORK_CONSTANTINOPLE"), Some("0"));
}
