#![cfg(unix)]

use super::common::{read_report, tilefuzz, write_config, write_config_with};
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use tempfile::TempDir;

#[test]
fn test_run_writes_reports() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(
        temp_dir.path(),
        "case \"$2\" in *Q*) echo quit >&2; exit 1;; esac\nexit 0\n",
    );

    tilefuzz(temp_dir.path())
        .arg("run")
        .arg("--config")
        .arg(&config)
        .args(["--seed", "3", "--max-iterations", "6", "--no-progress"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Iterations"))
        .stdout(predicate::str::contains("Reports written to"));

    let markdown = fs::read_to_string(temp_dir.path().join("out").join("report.md")).unwrap();
    assert!(markdown.starts_with("# tilefuzz Report"));
    assert!(markdown.contains("## History"));
    assert!(markdown.contains("--max-iterations: 6"));

    let report = read_report(temp_dir.path());
    let history = report["history"].as_array().unwrap();
    assert_eq!(history.len(), 6);
    assert_eq!(report["summary"]["seed"], 3);
    assert_eq!(report["summary"]["kind"], "fuzz");
    for (index, record) in history.iter().enumerate() {
        assert_eq!(record["iteration"], index as u64 + 1);
    }
}

#[test]
fn test_output_override() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "exit 0\n");
    let elsewhere = temp_dir.path().join("elsewhere");

    tilefuzz(temp_dir.path())
        .arg("run")
        .arg("--config")
        .arg(&config)
        .args(["--max-iterations", "2", "--no-progress", "--output"])
        .arg(&elsewhere)
        .assert()
        .success();

    assert!(elsewhere.join("report.md").exists());
    assert!(elsewhere.join("input.map").exists());
}

#[test]
fn test_missing_target_fails() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.json");
    fs::write(
        &config,
        r#"{ "target": { "program": "/nonexistent/tilefuzz-target", "args": [] } }"#,
    )
    .unwrap();

    tilefuzz(temp_dir.path())
        .arg("run")
        .arg("--config")
        .arg(&config)
        .args(["--max-iterations", "3", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to launch target"));

    assert!(!temp_dir.path().join("data/output/report.json").exists());
}

#[test]
fn test_failure_mid_run_still_writes_reports() {
    let temp_dir = TempDir::new().unwrap();
    let counter = temp_dir.path().join("count");
    let config = write_config(temp_dir.path(), "");

    // The target removes itself on its third run, so the fourth launch fails
    let target = temp_dir.path().join("target.sh");
    fs::write(
        &target,
        format!(
            "#!/bin/sh\necho x >> {}\nif [ $(wc -l < {}) -ge 3 ]; then rm \"$0\"; fi\nexit 0\n",
            counter.display(),
            counter.display()
        ),
    )
    .unwrap();
    fs::set_permissions(&target, fs::Permissions::from_mode(0o755)).unwrap();

    let mut value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&config).unwrap()).unwrap();
    value["target"]["program"] = serde_json::json!(target.display().to_string());
    value["target"]["args"] = serde_json::json!(["{input}"]);
    fs::write(&config, value.to_string()).unwrap();

    tilefuzz(temp_dir.path())
        .arg("run")
        .arg("--config")
        .arg(&config)
        .args(["--seed", "5", "--max-iterations", "10", "--no-progress"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to launch target"))
        .stderr(predicate::str::contains("Run aborted after 3 executions"));

    let report = read_report(temp_dir.path());
    assert_eq!(report["history"].as_array().unwrap().len(), 3);
    assert_eq!(report["summary"]["statistics"]["iterations"], 3);
}

#[test]
fn test_partial_report_written_during_run() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config_with(
        temp_dir.path(),
        "sleep 0.3\nexit 0\n",
        serde_json::json!({ "partial_report_interval_secs": 1 }),
    );

    tilefuzz(temp_dir.path())
        .arg("run")
        .arg("--config")
        .arg(&config)
        .args(["--max-iterations", "6", "--no-progress"])
        .assert()
        .success();

    let partial = fs::read_to_string(temp_dir.path().join("out").join("report_temp.md")).unwrap();
    assert!(partial.starts_with("# tilefuzz Report"));
    assert!(partial.contains("## History"));
    assert!(temp_dir.path().join("out").join("report.md").exists());
}

#[test]
fn test_partial_reports_off_by_default() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "exit 0\n");

    tilefuzz(temp_dir.path())
        .arg("run")
        .arg("--config")
        .arg(&config)
        .args(["--max-iterations", "3", "--no-progress"])
        .assert()
        .success();

    assert!(!temp_dir.path().join("out").join("report_temp.md").exists());
}
