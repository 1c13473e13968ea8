#![cfg(unix)]

use super::common::{read_report, tilefuzz, write_config};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_mutate_from_seed() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "exit 0\n");
    let seed_map = temp_dir.path().join("seed.map");
    fs::write(&seed_map, "0F\nP0\n").unwrap();

    tilefuzz(temp_dir.path())
        .arg("mutate")
        .arg("--map")
        .arg(&seed_map)
        .args(["--commands", "E", "--max-iterations", "4", "--no-progress"])
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("mutation"));

    let report = read_report(temp_dir.path());
    let history = report["history"].as_array().unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0]["note"], "Initial setup.");
    assert_eq!(history[0]["map"], "0F\nP0\n");
    assert_eq!(
        history[1]["note"],
        "From iteration 1: mutated '0' at index 0 to 'W' (wall)."
    );
    assert_eq!(history[2]["commands"], "S");
    assert_eq!(report["summary"]["mutation"]["search"]["end"], "budget_exhausted");
}

#[test]
fn test_mutate_rejects_unknown_command() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(temp_dir.path(), "exit 0\n");
    let seed_map = temp_dir.path().join("seed.map");
    fs::write(&seed_map, "0F\nP0\n").unwrap();

    tilefuzz(temp_dir.path())
        .arg("mutate")
        .arg("--map")
        .arg(&seed_map)
        .args(["--commands", "SXE", "--no-progress"])
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid seed commands"));

    assert!(!temp_dir.path().join("out").join("report.json").exists());
}

#[test]
fn test_mutate_missing_map() {
    let temp_dir = TempDir::new().unwrap();

    tilefuzz(temp_dir.path())
        .args(["mutate", "--map", "absent.map", "--commands", "E"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read seed map"));
}
