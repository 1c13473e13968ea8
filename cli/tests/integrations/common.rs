use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

pub fn tilefuzz(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tilefuzz").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

/// Config running `body` as a shell script against a 2x2 grade-3 generator
pub fn write_config(dir: &Path, body: &str) -> PathBuf {
    write_config_with(dir, body, serde_json::json!({}))
}

/// Like [`write_config`], with top-level keys replaced by `overrides`
pub fn write_config_with(dir: &Path, body: &str, overrides: serde_json::Value) -> PathBuf {
    let script = dir.join("target.sh");
    fs::write(&script, body).unwrap();

    let mut config = serde_json::json!({
        "grade": 3,
        "max_map_size": { "width": 2, "height": 2 },
        "max_sequence_length": 4,
        "target": {
            "program": "sh",
            "args": [script.display().to_string(), "{input}"],
            "timeout_ms": 5000
        },
        "output_dir": dir.join("out").display().to_string()
    });
    if let serde_json::Value::Object(overrides) = overrides {
        for (key, value) in overrides {
            config[key] = value;
        }
    }

    let path = dir.join("config.json");
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

pub fn read_report(dir: &Path) -> serde_json::Value {
    let text = fs::read_to_string(dir.join("out").join("report.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}
