//! # tilefuzz engine
//!
//! **Graded generation and mutation fuzzing for tile-map games**
//!
//! The engine produces inputs for a target program that reads a 2D tile map
//! from a file and a sequence of commands from its command line. It runs the
//! target once per input, classifies the outcome and keeps an ordered history
//! of every execution.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tilefuzz::{Budget, FuzzConfig, Fuzzer, FuzzResult};
//!
//! fn main() -> FuzzResult<()> {
//!     let mut config = FuzzConfig::default();
//!     config.seed = Some(42);
//!     config.budget = Budget::iterations(100);
//!
//!     let mut fuzzer = Fuzzer::from_config(config)?;
//!     let summary = fuzzer.run()?;
//!
//!     println!("{} executions, {} timeouts", summary.iterations(),
//!         summary.statistics.count(tilefuzz::Outcome::Timeout));
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Grades
//! Generated maps come in four correctness grades, from random binary noise
//! (grade 0) to valid maps with exactly one player and some food (grade 3).
//!
//! ### Mutation runs
//! Starting from a known input, the engine tries every single-symbol
//! substitution, alternating between the map and the command sequence, and
//! never executes the same input twice.
//!
//! ### Budgets
//! Runs stop after a number of iterations, an amount of wall-clock time, or
//! whichever comes first.

pub mod alphabet;
pub mod budget;
pub mod config;
pub mod context;
pub mod error;
pub mod fuzzer;
pub mod generator;
pub mod harness;
pub mod input;
pub mod mutation;
pub mod progress;
pub mod record;

pub use alphabet::{Command, Tile};
pub use budget::Budget;
pub use config::{FuzzConfig, Grade, MapSize, MutationConfig, TargetConfig};
pub use context::FuzzContext;
pub use error::FuzzError;
pub use fuzzer::{Fuzzer, MutationSummary, RunKind, RunSummary, INITIAL_SETUP_NOTE};
pub use generator::{CellSource, InputGenerator, MapGenerator};
pub use harness::{Execution, Executor, Outcome, ProcessHarness};
pub use input::{CommandSequence, MapString};
pub use mutation::{fingerprint, MutationEngine, MutationSink, SearchEnd, SearchReport};
pub use progress::{MutationProgress, ProgressSnapshot, ProgressTracker, RunState};
pub use record::{ErrorCount, RunHistory, RunRecord, RunStatistics};

/// Result type for fuzzing operations
pub type FuzzResult<T> = Result<T, FuzzError>;

#[cfg(test)]
mod tests;
