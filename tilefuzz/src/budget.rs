use crate::{FuzzError, FuzzResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Iteration and wall-clock ceilings of a run
///
/// Either bound may be unset. With both unset a run never stops on its own,
/// which is allowed but logged as a warning when the run starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    pub max_iterations: Option<u64>,
    pub max_time_secs: Option<u64>,
}

impl Budget {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn iterations(max_iterations: u64) -> Self {
        Self {
            max_iterations: Some(max_iterations),
            max_time_secs: None,
        }
    }

    pub fn seconds(max_time_secs: u64) -> Self {
        Self {
            max_iterations: None,
            max_time_secs: Some(max_time_secs),
        }
    }

    pub fn max_time(&self) -> Option<Duration> {
        self.max_time_secs.map(Duration::from_secs)
    }

    pub fn is_unbounded(&self) -> bool {
        self.max_iterations.is_none() && self.max_time_secs.is_none()
    }

    pub fn validate(&self) -> FuzzResult<()> {
        if self.max_iterations == Some(0) {
            return Err(FuzzError::config(
                "budget.max_iterations must be at least 1 when set",
            ));
        }
        if self.max_time_secs == Some(0) {
            return Err(FuzzError::config(
                "budget.max_time_secs must be at least 1 when set",
            ));
        }
        Ok(())
    }

    /// `iterations >= max_iterations` or `elapsed >= max_time`, ignoring unset bounds
    pub fn is_exhausted(&self, iterations: u64, elapsed: Duration) -> bool {
        let iterations_reached = self
            .max_iterations
            .is_some_and(|max| iterations >= max);
        let time_reached = self.max_time().is_some_and(|max| elapsed >= max);
        iterations_reached || time_reached
    }

    pub fn iteration_fraction(&self, iterations: u64) -> Option<f64> {
        self.max_iterations
            .map(|max| iterations as f64 / max as f64)
    }

    pub fn time_fraction(&self, elapsed: Duration) -> Option<f64> {
        self.max_time()
            .map(|max| elapsed.as_secs_f64() / max.as_secs_f64())
    }

    /// Larger of the time and iteration fractions, 0 when both bounds are unset
    pub fn fraction(&self, iterations: u64, elapsed: Duration) -> f64 {
        let time = self.time_fraction(elapsed);
        let iteration = self.iteration_fraction(iterations);
        match (time, iteration) {
            (None, None) => 0.0,
            (t, i) => t.unwrap_or(0.0).max(i.unwrap_or(0.0)),
        }
    }
}
