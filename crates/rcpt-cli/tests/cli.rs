use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const RECEIPT: &str = "ABC CAFE\nDate: 12/03/2024\nSubtotal: 450.00\nCGST: 20.00\nTotal: 495.00\n";

fn rcpt(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("rcpt").unwrap();
    cmd.arg("--config").arg(config);
    cmd
}

/// A temp dir holding a default config file.
fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    Command::cargo_bin("rcpt")
        .unwrap()
        .args(["config", "init", "--output"])
        .arg(&config)
        .assert()
        .success();
    (dir, config)
}

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn process_text_receipt_as_json() {
    let (dir, config) = workspace();
    let input = write(dir.path(), "cafe.txt", RECEIPT);

    rcpt(&config)
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"date\": \"2024-03-12\""))
        .stdout(predicate::str::contains("\"description\": \"ABC CAFE\""))
        .stdout(predicate::str::contains("495.00"))
        .stdout(predicate::str::contains("\"type\": \"expense\""))
        .stdout(predicate::str::contains("\"category\": \"Uncategorized\""));
}

#[test]
fn process_text_receipt_as_csv() {
    let (dir, config) = workspace();
    let input = write(dir.path(), "cafe.txt", RECEIPT);

    rcpt(&config)
        .args(["process", "--format", "csv"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("date,description,amount,type,category"))
        .stdout(predicate::str::contains("2024-03-12,ABC CAFE,495.00,expense,Uncategorized"));
}

#[test]
fn process_report_names_strategy() {
    let (dir, config) = workspace();
    let input = write(dir.path(), "cafe.txt", RECEIPT);

    rcpt(&config)
        .args(["process", "--report"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pass\": \"supplied\""))
        .stdout(predicate::str::contains("\"amount_strategy\": \"total_line\""));
}

#[test]
fn process_sparse_text_fails() {
    let (dir, config) = workspace();
    let input = write(dir.path(), "blank.txt", "a 1\n");

    rcpt(&config)
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not extract"));
}

#[test]
fn process_rejects_unknown_extension() {
    let (dir, config) = workspace();
    let input = write(dir.path(), "notes.md", RECEIPT);

    rcpt(&config)
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format"));
}

#[test]
fn process_writes_output_file() {
    let (dir, config) = workspace();
    let input = write(dir.path(), "cafe.txt", RECEIPT);
    let output = dir.path().join("out.json");

    rcpt(&config)
        .arg("process")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("ABC CAFE"));
}

#[test]
fn batch_writes_summary() {
    let (dir, config) = workspace();
    let inputs = dir.path().join("inputs");
    fs::create_dir_all(&inputs).unwrap();
    write(&inputs, "a_cafe.txt", RECEIPT);
    write(&inputs, "b_blank.txt", "??\n");
    let out = dir.path().join("out");

    let pattern = format!("{}/*.txt", inputs.display());
    rcpt(&config)
        .args(["batch", "--summary", "-j", "2", "--output-dir"])
        .arg(&out)
        .arg(&pattern)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 extracted"));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.contains("a_cafe.txt,success,2024-03-12,ABC CAFE,495.00,expense"));
    assert!(summary.contains("b_blank.txt,not_found"));
    assert!(out.join("a_cafe.json").exists());
}

#[test]
fn config_set_then_get() {
    let (_dir, config) = workspace();

    rcpt(&config)
        .args(["config", "set", "extraction.min_text_chars", "12"])
        .assert()
        .success();

    rcpt(&config)
        .args(["config", "get", "extraction.min_text_chars"])
        .assert()
        .success()
        .stdout(predicate::str::diff("12\n"));
}

#[test]
fn config_set_rejects_unknown_key() {
    let (_dir, config) = workspace();

    rcpt(&config)
        .args(["config", "set", "extraction.no_such_key", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
