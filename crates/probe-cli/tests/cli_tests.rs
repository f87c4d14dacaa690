//! CLI integration tests for chainprobe
//!
//! Tests argument handling, configuration errors and exit status.

use std::path::Path;
use std::process::Command;

/// Nothing listens here; control-plane calls fail fast
const DEAD_SIMULATOR: &str = "http://127.0.0.1:1";

/// Helper to run the CLI with arguments
fn run_chainprobe(args: &[&str], cwd: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_chainprobe"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .env_remove("HIVE_SIMULATOR")
        .output()
        .expect("Failed to execute command")
}

fn write_config(dir: &Path, body: &str) -> String {
    let path = dir.join("run.toml");
    std::fs::write(&path, body).unwrap();
    path.display().to_string()
}

// ==================== Help & Version Tests ====================

#[test]
fn test_cli_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_chainprobe(&["--help"], dir.path());
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("chainprobe"));
    assert!(stdout.contains("--config"));
    assert!(stdout.contains("--workers"));
    assert!(stdout.contains("--reuse-nodes"));
    assert!(stdout.contains("HIVE_SIMULATOR"));
}

#[test]
fn test_cli_version() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_chainprobe(&["--version"], dir.path());
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("chainprobe"));
}

// ==================== Configuration Tests ====================

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_chainprobe(&["--config", "absent.toml"], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load configuration"));
}

#[test]
fn test_unknown_ruleset_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"
            [[collection]]
            path = "suites"
            ruleset = "Atlantis"
        "#,
    );
    let output = run_chainprobe(&["--config", &config, "--simulator", DEAD_SIMULATOR], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Network `Atlantis` not defined in ruleset"));
}

#[test]
fn test_invalid_worker_count() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("suites")).unwrap();
    let config = write_config(dir.path(), "[[collection]]\npath = \"suites\"\n");
    let output = run_chainprobe(
        &["--config", &config, "--workers", "32", "--simulator", DEAD_SIMULATOR],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("workers must be between 1 and 16"));
}

#[test]
fn test_default_plan_needs_suite_directory() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_chainprobe(&["--simulator", DEAD_SIMULATOR], dir.path());
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("tests/BlockchainTests"));
}

// ==================== Exit Status Tests ====================

#[test]
fn test_empty_collection_passes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("suites")).unwrap();
    let config = write_config(dir.path(), "[[collection]]\npath = \"suites\"\n");
    let output = run_chainprobe(&["--config", &config, "--simulator", DEAD_SIMULATOR], dir.path());
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Test Results Summary"));
}

#[test]
fn test_failed_case_sets_exit_status_and_report() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("suites")).unwrap();
    std::fs::write(
        dir.path().join("suites/bc.json"),
        r#"{"broken": {"pre": {}, "blocks": []}}"#,
    )
    .unwrap();
    let config = write_config(dir.path(), "[[collection]]\nname = \"blocks\"\npath = \"suites\"\n");

    let output = run_chainprobe(
        &[
            "--config",
            &config,
            "--simulator",
            DEAD_SIMULATOR,
            "--report",
            "report.md",
        ],
        dir.path(),
    );
    assert_eq!(output.status.code(), Some(1));

    let report = std::fs::read_to_string(dir.path().join("report.md")).unwrap();
    assert!(report.starts_with("# blocks"));
    assert!(report.contains("## Failed"));
    assert!(report.contains("Testcase failed initial validation"));
}

#[test]
fn test_blacklisted_case_passes() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("suites")).unwrap();
    std::fs::write(
        dir.path().join("suites/bc.json"),
        r#"{"broken": {"pre": {}, "blocks": []}}"#,
    )
    .unwrap();
    let config = write_config(dir.path(), "[[collection]]\npath = \"suites\"\n");

    let output = run_chainprobe(
        &[
            "--config",
            &config,
            "--simulator",
            DEAD_SIMULATOR,
            "--blacklist",
            "broken",
        ],
        dir.path(),
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
}
