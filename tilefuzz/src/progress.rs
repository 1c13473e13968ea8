//! Live progress shared between the worker and an observer.
//!
//! The worker is the only writer. Observers (a console bar, a log line) poll
//! [`ProgressTracker::snapshot`] and never touch engine state, so every field
//! is an atomic and no lock is taken on either side.

use crate::budget::Budget;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// Lifecycle of a run controller
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Running,
    Finished,
}

impl RunState {
    fn to_u8(self) -> u8 {
        match self {
            RunState::Idle => 0,
            RunState::Running => 1,
            RunState::Finished => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => RunState::Running,
            2 => RunState::Finished,
            _ => RunState::Idle,
        }
    }
}

#[derive(Debug)]
pub struct ProgressTracker {
    budget: Budget,
    origin: Instant,
    started_nanos: AtomicU64,
    finished_nanos: AtomicU64,
    state: AtomicU8,
    iterations: AtomicU64,
    visited: AtomicU64,
    /// 0 outside mutation runs
    estimated_total: AtomicU64,
}

impl ProgressTracker {
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            origin: Instant::now(),
            started_nanos: AtomicU64::new(0),
            finished_nanos: AtomicU64::new(0),
            state: AtomicU8::new(RunState::Idle.to_u8()),
            iterations: AtomicU64::new(0),
            visited: AtomicU64::new(0),
            estimated_total: AtomicU64::new(0),
        }
    }

    pub fn budget(&self) -> &Budget {
        &self.budget
    }

    fn nanos_since_origin(&self) -> u64 {
        self.origin.elapsed().as_nanos().min(u128::from(u64::MAX)) as u64
    }

    /// Reset counters and restart the clock
    pub(crate) fn begin(&self, estimated_total: Option<u64>) {
        self.iterations.store(0, Ordering::Release);
        self.visited.store(0, Ordering::Release);
        self.estimated_total
            .store(estimated_total.unwrap_or(0), Ordering::Release);
        self.started_nanos
            .store(self.nanos_since_origin(), Ordering::Release);
        self.state.store(RunState::Running.to_u8(), Ordering::Release);
    }

    /// Count one execution; returns its 1-based iteration number
    pub(crate) fn next_iteration(&self) -> u64 {
        self.iterations.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn set_visited(&self, visited: u64) {
        self.visited.store(visited, Ordering::Release);
    }

    /// Freeze the clock and mark the run finished
    pub(crate) fn finish(&self) {
        self.finished_nanos
            .store(self.nanos_since_origin(), Ordering::Release);
        self.state.store(RunState::Finished.to_u8(), Ordering::Release);
    }

    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Acquire)
    }

    pub fn elapsed(&self) -> Duration {
        let started = self.started_nanos.load(Ordering::Acquire);
        let now = match self.state() {
            RunState::Idle => return Duration::ZERO,
            RunState::Running => self.nanos_since_origin(),
            RunState::Finished => self.finished_nanos.load(Ordering::Acquire),
        };
        Duration::from_nanos(now.saturating_sub(started))
    }

    pub fn is_budget_exhausted(&self) -> bool {
        self.budget.is_exhausted(self.iterations(), self.elapsed())
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let state = self.state();
        let iterations = self.iterations();
        let elapsed = self.elapsed();
        let estimated_total = self.estimated_total.load(Ordering::Acquire);

        let mutations = (estimated_total > 0).then(|| MutationProgress {
            visited: self.visited.load(Ordering::Acquire),
            estimated_total,
        });

        let fraction = match state {
            RunState::Finished => 1.0,
            RunState::Idle => 0.0,
            RunState::Running => {
                let budget_fraction = self.budget.fraction(iterations, elapsed);
                let mutation_fraction = mutations
                    .as_ref()
                    .map(|m| m.visited as f64 / m.estimated_total as f64)
                    .unwrap_or(0.0);
                budget_fraction.max(mutation_fraction).clamp(0.0, 1.0)
            }
        };

        ProgressSnapshot {
            state,
            fraction,
            iterations,
            max_iterations: self.budget.max_iterations,
            elapsed,
            max_time: self.budget.max_time(),
            mutations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MutationProgress {
    pub visited: u64,
    /// Upper bound of the search space, used only as a denominator
    pub estimated_total: u64,
}

/// Point-in-time view of a run, safe to render from any thread
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub state: RunState,
    /// In `[0, 1]`
    pub fraction: f64,
    pub iterations: u64,
    pub max_iterations: Option<u64>,
    pub elapsed: Duration,
    pub max_time: Option<Duration>,
    pub mutations: Option<MutationProgress>,
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(mutations) = &self.mutations {
            write!(
                f,
                " -- Mutations: {}/{}",
                mutations.visited, mutations.estimated_total
            )?;
        }
        match self.max_iterations {
            Some(max) => write!(f, " -- Iteration: {}/{}", self.iterations, max)?,
            None => write!(f, " -- Iteration: {}", self.iterations)?,
        }
        if let Some(max_time) = self.max_time {
            write!(
                f,
                " -- Time: {:.1}/{} seconds",
                self.elapsed.as_secs_f64(),
                max_time.as_secs()
            )?;
        }
        write!(f, " -- Elapsed: {:.1}s", self.elapsed.as_secs_f64())
    }
}
