use super::common::tilefuzz;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_generate_with_fixed_size() {
    let temp_dir = TempDir::new().unwrap();

    let output = tilefuzz(temp_dir.path())
        .args(["generate", "--seed", "5", "--grade", "2", "--width", "4", "--height", "3"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 4);
    for row in &lines[..3] {
        assert_eq!(row.len(), 4);
        assert!(row.chars().all(|c| "W0MPF".contains(c)), "{}", row);
    }
    assert!(!lines[3].is_empty());
    assert!(lines[3].chars().all(|c| "ESQWUDLR".contains(c)));
}

#[test]
fn test_generate_is_reproducible() {
    let temp_dir = TempDir::new().unwrap();
    let run = || {
        tilefuzz(temp_dir.path())
            .args(["generate", "--seed", "99"])
            .output()
            .unwrap()
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn test_generate_rejects_grade() {
    let temp_dir = TempDir::new().unwrap();

    tilefuzz(temp_dir.path())
        .args(["generate", "--grade", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("between 0 and 3"));
}

#[test]
fn test_missing_explicit_config() {
    let temp_dir = TempDir::new().unwrap();

    tilefuzz(temp_dir.path())
        .args(["generate", "--config", "nowhere.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config nowhere.json"));
}

#[test]
fn test_invalid_config_value() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("config.json");
    fs::write(&config, r#"{ "max_sequence_length": 0 }"#).unwrap();

    tilefuzz(temp_dir.path())
        .arg("generate")
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_sequence_length"));
}
