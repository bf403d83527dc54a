//! Smoke tests for the cukedash CLI
//!
//! These run the real binary against throwaway report trees.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const RESULTS: &str = r#"[
  {
    "uri": "features/sales/salesforce_price-books.feature",
    "name": "Price Books",
    "elements": [
      {"name": "Create a price book", "type": "scenario",
       "steps": [{"keyword": "Given ", "name": "I am logged in", "result": {"status": "passed", "duration": 1000000}}]}
    ]
  },
  {
    "name": "Invoice approvals",
    "elements": [
      {"name": "Approve", "type": "scenario",
       "steps": [{"keyword": "When ", "name": "I approve", "result": {"status": "failed", "error_message": "boom"}}]}
    ]
  }
]"#;

/// Get a command for the cukedash binary
fn cukedash() -> Command {
    let mut cmd = Command::cargo_bin("cukedash").expect("cukedash binary should exist");
    cmd.env_remove("CUKEDASH_REPORTS_ROOT").env_remove("RUST_LOG");
    cmd
}

fn seeded_root() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("cucumber-report.json"), RESULTS).unwrap();
    tmp
}

fn root_arg(root: &Path) -> [String; 2] {
    ["--reports-root".to_string(), root.display().to_string()]
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    cukedash()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.4.0"));
}

#[test]
fn test_help_flag() {
    cukedash()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("build"))
        .stdout(predicate::str::contains("index"));
}

#[test]
fn test_no_args_fails() {
    cukedash().assert().failure();
}

// ============================================================================
// Classify
// ============================================================================

#[test]
fn test_classify_single_title() {
    cukedash()
        .args(["classify", "--name", "Approve credit note"])
        .assert()
        .success()
        .stdout(predicate::str::contains("finance/credit-notes"))
        .stdout(predicate::str::contains("keyword"));
}

#[test]
fn test_classify_result_file_json() {
    let tmp = seeded_root();
    cukedash()
        .args(root_arg(tmp.path()))
        .args(["classify", "--mode", "simple", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""feature": "price-books""#))
        .stdout(predicate::str::contains(r#""module": "finance""#));
}

#[test]
fn test_classify_missing_results_exits_nonzero() {
    let tmp = TempDir::new().unwrap();
    cukedash()
        .args(root_arg(tmp.path()))
        .arg("classify")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Result file not found"));
}

// ============================================================================
// Report tree commands
// ============================================================================

#[test]
fn test_render_writes_report_and_dashboard() {
    let tmp = seeded_root();
    cukedash()
        .args(root_arg(tmp.path()))
        .args(["render", "--module", "sales", "--feature", "price-books"])
        .assert()
        .success();

    assert!(tmp.path().join("sales/price-books/report.html").is_file());
    let index = fs::read_to_string(tmp.path().join("index.html")).unwrap();
    assert!(index.contains("sales/price-books/report.html"));
}

#[test]
fn test_render_without_results_still_succeeds() {
    let tmp = TempDir::new().unwrap();
    cukedash()
        .args(root_arg(tmp.path()))
        .args(["render", "--module", "sales", "--feature", "leads"])
        .assert()
        .success();
    assert!(tmp.path().join("index.html").is_file());
    assert!(!tmp.path().join("sales/leads/report.html").exists());
}

#[test]
fn test_render_rejects_parent_dir_module() {
    let tmp = seeded_root();
    let root = tmp.path().join("reports");
    cukedash()
        .args(root_arg(&root))
        .args(["render", "--module", "..", "--feature", "price-books"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid bucket"));
    assert!(!tmp.path().join("price-books").exists());
}

#[test]
fn test_build_moves_screenshots() {
    let tmp = seeded_root();
    let flat = tmp.path().join("screenshots");
    fs::create_dir_all(&flat).unwrap();
    fs::write(flat.join("invoices_failure_1.png"), b"png").unwrap();

    cukedash()
        .args(root_arg(tmp.path()))
        .args(["-q", "build"])
        .assert()
        .success();

    assert!(tmp.path().join("finance/invoices/report.html").is_file());
    assert!(flat.join("finance/invoices/invoices_failure_1.png").is_file());
    assert!(tmp.path().join("sales/price-books/report.html").is_file());
}

#[test]
fn test_build_missing_results_exits_nonzero() {
    let tmp = TempDir::new().unwrap();
    cukedash()
        .args(root_arg(tmp.path()))
        .arg("build")
        .assert()
        .failure();
}

#[test]
fn test_organize_copy() {
    let tmp = TempDir::new().unwrap();
    let captures = tmp.path().join("screenshots/sales/leads");
    fs::create_dir_all(&captures).unwrap();
    fs::write(captures.join("convert_success_1.png"), b"png").unwrap();

    cukedash()
        .args(root_arg(tmp.path()))
        .args(["organize", "--module", "sales", "--feature", "leads", "--color", "never"])
        .assert()
        .success()
        .stderr(predicate::str::contains("1 screenshot(s) copied"));

    assert!(tmp
        .path()
        .join("sales/leads/screenshots/convert_success_1.png")
        .is_file());
}

#[test]
fn test_index_on_empty_root() {
    let tmp = TempDir::new().unwrap();
    cukedash()
        .args(root_arg(tmp.path()))
        .args(["index", "--color", "never"])
        .assert()
        .success()
        .stderr(predicate::str::contains("0 modules"));
}

#[test]
fn test_reports_root_from_env() {
    let tmp = seeded_root();
    cukedash()
        .env("CUKEDASH_REPORTS_ROOT", tmp.path())
        .arg("index")
        .assert()
        .success();
    assert!(tmp.path().join("index.html").is_file());
}

// ============================================================================
// Config
// ============================================================================

#[test]
fn test_config_prints_defaults() {
    cukedash()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("reports_root: cucumber-reports"))
        .stdout(predicate::str::contains("flush_delay_ms: 2000"));
}

#[test]
fn test_config_file_and_flag_layering() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("cukedash.yaml");
    fs::write(&file, "reports_root: from-file\nmetadata:\n  environment: UAT\n").unwrap();

    cukedash()
        .args(["config", "--config"])
        .arg(&file)
        .args(["--reports-root", "from-flag"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reports_root: from-flag"))
        .stdout(predicate::str::contains("environment: UAT"));
}

#[test]
fn test_invalid_config_file_exits_nonzero() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("broken.yaml");
    fs::write(&file, "flush_delay_ms: [oops").unwrap();

    cukedash()
        .arg("config")
        .arg("--config")
        .arg(&file)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}
