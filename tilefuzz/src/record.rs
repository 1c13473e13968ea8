use crate::harness::{Execution, Outcome};
use crate::input::{CommandSequence, MapString};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// One execution of the target, as recorded in the run history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    /// 1-based, monotonic within a run
    pub iteration: u64,
    pub outcome: Outcome,
    pub map: MapString,
    pub commands: CommandSequence,
    /// stdout followed by stderr, verbatim
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl RunRecord {
    pub fn new(
        iteration: u64,
        map: MapString,
        commands: CommandSequence,
        execution: Execution,
        note: Option<String>,
    ) -> Self {
        Self {
            iteration,
            outcome: execution.outcome,
            map,
            commands,
            output: execution.output,
            note,
            duration: execution.duration,
        }
    }
}

/// Append-only, ordered list of run records
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct RunHistory {
    records: Vec<RunRecord>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: RunRecord) {
        self.records.push(record);
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&RunRecord> {
        self.records.last()
    }

    pub fn statistics(&self, runtime: Duration) -> RunStatistics {
        let mut outcomes: BTreeMap<String, u64> = BTreeMap::new();
        let mut output_counts: BTreeMap<&str, u64> = BTreeMap::new();

        for record in &self.records {
            *outcomes.entry(record.outcome.to_string()).or_default() += 1;
            if !record.outcome.is_clean_exit() {
                *output_counts.entry(record.output.as_str()).or_default() += 1;
            }
        }

        let mut errors: Vec<ErrorCount> = output_counts
            .into_iter()
            .map(|(output, count)| ErrorCount {
                output: output.to_string(),
                count,
            })
            .collect();
        // stable: ties keep the lexical order of the map
        errors.sort_by(|a, b| b.count.cmp(&a.count));

        RunStatistics {
            iterations: self.records.len() as u64,
            outcomes,
            errors,
            runtime,
        }
    }
}

impl<'a> IntoIterator for &'a RunHistory {
    type Item = &'a RunRecord;
    type IntoIter = std::slice::Iter<'a, RunRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Number of problem executions that produced the same output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorCount {
    pub output: String,
    pub count: u64,
}

/// Aggregate view over a finished (or partial) history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStatistics {
    pub iterations: u64,
    /// Keyed by the outcome's display form (`0`, `1`, `timeout`, `crash`, ...)
    pub outcomes: BTreeMap<String, u64>,
    /// Outputs of executions that did not exit cleanly, most frequent first
    pub errors: Vec<ErrorCount>,
    #[serde(with = "duration_millis")]
    pub runtime: Duration,
}

impl RunStatistics {
    pub fn count(&self, outcome: Outcome) -> u64 {
        self.outcomes
            .get(&outcome.to_string())
            .copied()
            .unwrap_or(0)
    }
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis().min(u128::from(u64::MAX)) as u64)
    }
}
