#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const INPUT: &str = "\
Current User Question,Conversation History,Fragment Texts,Assistant Answer
What is the refund window?,,Refunds are accepted within 30 days.,You have 30 days.
Can I extend it?,,Extensions are not offered.,No extensions are available.
";

fn ragjudge(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ragjudge").unwrap();
    cmd.current_dir(dir)
        .env_remove("GEMINI_API_KEY")
        .env_remove("RAGJUDGE_JUDGE")
        .env_remove("RAGJUDGE_JUDGE_MODEL")
        .env_remove("RUST_LOG");
    cmd
}

fn files_with_prefix(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix))
        })
        .collect()
}

#[test]
fn fake_judge_run_writes_all_reports() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("input.csv"), INPUT).unwrap();

    ragjudge(dir.path())
        .args(["run", "--csv", "input.csv", "--output", "reports", "--judge", "fake"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Evaluation complete."))
        .stderr(predicate::str::contains("Rows evaluated: 2"));

    let out = dir.path().join("reports");
    assert_eq!(files_with_prefix(&out, "scored_dataset_").len(), 1);
    assert_eq!(files_with_prefix(&out, "evaluation_report_").len(), 1);
    let stats_path = &files_with_prefix(&out, "aggregate_stats_")[0];
    let stats: Value = serde_json::from_str(&fs::read_to_string(stats_path).unwrap()).unwrap();
    assert_eq!(stats["total_rows_evaluated"], 2);
    assert_eq!(stats["degraded_dimension_count"], 0);
    assert_eq!(stats["per_dimension_stats"]["Relevance"]["average_score"], 7.0);
}

#[test]
fn limit_restricts_rows() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("input.csv"), INPUT).unwrap();

    ragjudge(dir.path())
        .args(["run", "--csv", "input.csv", "--output", "out", "--judge", "fake", "--limit", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Rows evaluated: 1"));
}

#[test]
fn missing_input_is_a_config_error() {
    let dir = tempdir().unwrap();

    ragjudge(dir.path())
        .args(["run", "--csv", "nope.csv", "--output", "out", "--judge", "fake"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("E_INPUT_UNAVAILABLE"))
        .stderr(predicate::str::contains("nope.csv"));

    assert!(!dir.path().join("out").exists());
}

#[test]
fn gemini_without_api_key_fails_before_reading_input() {
    let dir = tempdir().unwrap();

    ragjudge(dir.path())
        .args(["run", "--csv", "nope.csv", "--output", "out", "--judge", "gemini"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("E_MISSING_CREDENTIAL"))
        .stderr(predicate::str::contains("GEMINI_API_KEY"));
}

#[test]
fn min_score_gate_fails_after_writing_reports() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("input.csv"), INPUT).unwrap();
    fs::write(
        dir.path().join("low.yaml"),
        "version: 1\njudge:\n  provider: fake\n  fake_score: 3\n",
    )
    .unwrap();

    ragjudge(dir.path())
        .args([
            "run", "--csv", "input.csv", "--output", "out", "--config", "low.yaml",
            "--min-score", "5",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("below --min-score"));

    assert_eq!(files_with_prefix(&dir.path().join("out"), "scored_dataset_").len(), 1);
}

#[test]
fn unsupported_config_version_is_rejected() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("input.csv"), INPUT).unwrap();
    fs::write(dir.path().join("ragjudge.yaml"), "version: 9\n").unwrap();

    ragjudge(dir.path())
        .args(["run", "--csv", "input.csv", "--output", "out", "--judge", "fake"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("E_CFG_PARSE"));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let dir = tempdir().unwrap();

    ragjudge(dir.path()).arg("init").assert().success();
    let written = fs::read_to_string(dir.path().join("ragjudge.yaml")).unwrap();
    assert!(written.contains("version: 1"));

    ragjudge(dir.path())
        .arg("init")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("already exists"));

    ragjudge(dir.path()).args(["init", "--force"]).assert().success();
}

#[test]
fn version_prints_package_version() {
    let dir = tempdir().unwrap();
    ragjudge(dir.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
