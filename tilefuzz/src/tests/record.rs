use crate::harness::{Execution, Outcome};
use crate::input::{CommandSequence, MapString};
use crate::record::{RunHistory, RunRecord};
use std::time::Duration;

fn record(iteration: u64, outcome: Outcome, output: &str) -> RunRecord {
    RunRecord::new(
        iteration,
        MapString::from("0F\nP0\n"),
        CommandSequence::parse("SE").unwrap(),
        Execution {
            outcome,
            output: output.to_string(),
            duration: Duration::from_millis(12),
        },
        None,
    )
}

fn history(records: Vec<RunRecord>) -> RunHistory {
    let mut history = RunHistory::new();
    for record in records {
        history.push(record);
    }
    history
}

#[test]
fn test_statistics_group_outcomes() {
    let history = history(vec![
        record(1, Outcome::Exited(0), ""),
        record(2, Outcome::Exited(1), "boom"),
        record(3, Outcome::Timeout, "hang"),
        record(4, Outcome::Exited(0), ""),
        record(5, Outcome::Exited(1), "boom"),
        record(6, Outcome::Crashed, ""),
    ]);

    let stats = history.statistics(Duration::from_secs(2));
    assert_eq!(stats.iterations, 6);
    assert_eq!(stats.count(Outcome::Exited(0)), 2);
    assert_eq!(stats.count(Outcome::Exited(1)), 2);
    assert_eq!(stats.count(Outcome::Timeout), 1);
    assert_eq!(stats.count(Outcome::Crashed), 1);
    assert_eq!(stats.count(Outcome::Exited(2)), 0);
    assert_eq!(stats.runtime, Duration::from_secs(2));
}

#[test]
fn test_errors_sorted_by_frequency() {
    let history = history(vec![
        record(1, Outcome::Exited(1), "a"),
        record(2, Outcome::Exited(1), "b"),
        record(3, Outcome::Exited(1), "b"),
        record(4, Outcome::Exited(0), "b"),
        record(5, Outcome::Timeout, "c"),
    ]);

    let errors = history.statistics(Duration::ZERO).errors;
    let summary: Vec<(&str, u64)> = errors.iter().map(|e| (e.output.as_str(), e.count)).collect();
    assert_eq!(summary, vec![("b", 2), ("a", 1), ("c", 1)]);
}

#[test]
fn test_empty_history() {
    let stats = RunHistory::new().statistics(Duration::ZERO);
    assert_eq!(stats.iterations, 0);
    assert!(stats.outcomes.is_empty());
    assert!(stats.errors.is_empty());
}

#[test]
fn test_record_json_shape() {
    let value = serde_json::to_value(record(3, Outcome::Exited(1), "boom")).unwrap();
    assert_eq!(value["iteration"], 3);
    assert_eq!(value["outcome"]["kind"], "exited");
    assert_eq!(value["outcome"]["code"], 1);
    assert_eq!(value["map"], "0F\nP0\n");
    assert_eq!(value["commands"], "SE");
    assert_eq!(value["duration"], 12);
    assert!(value.get("note").is_none());

    let value = serde_json::to_value(record(4, Outcome::Timeout, "")).unwrap();
    assert_eq!(value["outcome"]["kind"], "timeout");
}

#[test]
fn test_outcome_display() {
    assert_eq!(Outcome::Exited(0).to_string(), "0");
    assert_eq!(Outcome::Exited(-1).to_string(), "-1");
    assert_eq!(Outcome::Timeout.to_string(), "timeout");
    assert_eq!(Outcome::Crashed.to_string(), "crash");
    assert!(Outcome::Exited(0).is_clean_exit());
    assert!(!Outcome::Timeout.is_clean_exit());
}
