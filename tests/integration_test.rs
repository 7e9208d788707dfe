//! Integration tests for the data-loop CLI.
//!
//! These tests run the actual binary and verify output against expected CSV files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;

/// Get path to test data file
fn test_data_path(filename: &str) -> String {
    format!("tests/data/{}", filename)
}

/// Run the binary on a command log with extra arguments and return stdout
fn run_ledger(input_file: &str, extra: &[&str]) -> String {
    let mut cmd = Command::cargo_bin("data-loop").unwrap();
    let assert = cmd
        .arg(test_data_path(input_file))
        .args(extra)
        .env_remove("DATA_LOOP_SETTLEMENT")
        .env_remove("DATA_LOOP_CLOSE")
        .assert()
        .success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

/// Trimmed non-empty lines, order preserved (reports are sorted by key)
fn lines(csv: &str) -> Vec<String> {
    csv.lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn assert_matches_expected(output: &str, expected_file: &str) {
    let expected = fs::read_to_string(test_data_path(expected_file)).unwrap();
    assert_eq!(lines(output), lines(&expected));
}

#[test]
fn test_sample_a_default_report_is_balances() {
    let output = run_ledger("sample_a_end_to_end.csv", &[]);
    assert_matches_expected(&output, "expected_a_balances.csv");
}

#[test]
fn test_sample_a_receipts() {
    let output = run_ledger("sample_a_end_to_end.csv", &["--report", "receipts"]);
    assert_matches_expected(&output, "expected_a_receipts.csv");
}

#[test]
fn test_sample_b_minimum_rate() {
    let output = run_ledger("sample_b_min_rate.csv", &["--report", "receipts"]);
    assert_matches_expected(&output, "expected_b_receipts.csv");

    let output = run_ledger("sample_b_min_rate.csv", &["--report", "streams"]);
    assert_matches_expected(&output, "expected_b_streams.csv");
}

#[test]
fn test_sample_c_failures_and_whitespace() {
    let output = run_ledger("sample_c_failures.csv", &["--report", "receipts"]);
    assert_matches_expected(&output, "expected_c_receipts.csv");

    let output = run_ledger("sample_c_failures.csv", &[]);
    assert_matches_expected(&output, "expected_c_balances.csv");

    let output = run_ledger("sample_c_failures.csv", &["--report", "payments"]);
    assert_matches_expected(&output, "expected_c_payments.csv");
}

#[test]
fn test_config_genesis_and_settlement_policy() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        config,
        r#"settlement = "anyone"

[[genesis]]
principal = "wallet_2"
balance = 500
"#
    )
    .unwrap();

    let mut commands = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        commands,
        "op,caller,height,stream,subscriber,amount,rate,name,description,category,payload
register-provider,wallet_1,0,,,,,Provider,,,
create-stream,wallet_1,0,,,100,,Feed,,,
start-payment-stream,wallet_2,0,0,,,4,,,,
process-payment,keeper,5,0,wallet_2,,,,,,"
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("data-loop").unwrap();
    let assert = cmd
        .arg(commands.path())
        .arg("--config")
        .arg(config.path())
        .env_remove("DATA_LOOP_SETTLEMENT")
        .env_remove("DATA_LOOP_CLOSE")
        .assert()
        .success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).unwrap();

    assert_eq!(
        lines(&output),
        vec!["principal,balance", "wallet_1,20", "wallet_2,480"]
    );
}

#[test]
fn test_env_overrides_close_policy() {
    let mut commands = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        commands,
        "op,caller,height,stream,subscriber,amount,rate,name,description,category,payload
fund,wallet_2,0,,,100,,,,,
register-provider,wallet_1,0,,,,,Provider,,,
create-stream,wallet_1,0,,,100,,Feed,,,
start-payment-stream,wallet_2,0,0,,,1,,,,
close-payment-stream,wallet_1,3,0,wallet_2,,,,,,"
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("data-loop").unwrap();
    cmd.arg(commands.path())
        .args(["--report", "receipts"])
        .env("DATA_LOOP_CLOSE", "provider")
        .assert()
        .success()
        .stdout(predicate::str::contains("6,close-payment-stream,ok,3"));
}

#[test]
fn test_missing_file_error() {
    let mut cmd = Command::cargo_bin("data-loop").unwrap();
    cmd.arg("nonexistent.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error").or(predicate::str::contains("Error")));
}

#[test]
fn test_missing_argument_error() {
    let mut cmd = Command::cargo_bin("data-loop").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Missing input file"));
}

#[test]
fn test_unknown_report_error() {
    let mut cmd = Command::cargo_bin("data-loop").unwrap();
    cmd.arg(test_data_path("sample_a_end_to_end.csv"))
        .args(["--report", "ledger"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown argument: ledger"));
}

#[test]
fn test_invalid_config_error() {
    let mut config = tempfile::NamedTempFile::new().unwrap();
    writeln!(config, "close = \"whoever\"").unwrap();

    let mut cmd = Command::cargo_bin("data-loop").unwrap();
    cmd.arg(test_data_path("sample_a_end_to_end.csv"))
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}
