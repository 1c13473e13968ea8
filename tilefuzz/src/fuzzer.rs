use crate::budget::Budget;
use crate::config::FuzzConfig;
use crate::context::FuzzContext;
use crate::generator::InputGenerator;
use crate::harness::{Executor, ProcessHarness};
use crate::input::{CommandSequence, MapString};
use crate::mutation::{estimated_total, MutationEngine, MutationSink, SearchEnd, SearchReport};
use crate::progress::{ProgressSnapshot, ProgressTracker, RunState};
use crate::record::{RunHistory, RunRecord, RunStatistics};
use crate::FuzzResult;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Note attached to the seed execution of a mutation run
pub const INITIAL_SETUP_NOTE: &str = "Initial setup.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunKind {
    Fuzz,
    Mutation,
}

/// Mutation-specific part of a run summary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationSummary {
    pub visited: u64,
    pub estimated_total: u64,
    pub search: SearchReport,
}

/// Returned when a run finishes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub kind: RunKind,
    pub seed: u64,
    pub budget: Budget,
    pub statistics: RunStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation: Option<MutationSummary>,
}

impl RunSummary {
    pub fn iterations(&self) -> u64 {
        self.statistics.iterations
    }

    pub fn runtime(&self) -> Duration {
        self.statistics.runtime
    }
}

/// Periodic callback receiving the history recorded so far
struct Checkpoint {
    interval: Duration,
    last: Instant,
    callback: Box<dyn FnMut(&RunSummary, &RunHistory)>,
}

impl Checkpoint {
    fn fire_if_due(
        &mut self,
        kind: RunKind,
        seed: u64,
        progress: &ProgressTracker,
        history: &RunHistory,
    ) {
        if self.last.elapsed() < self.interval {
            return;
        }
        self.last = Instant::now();

        let summary = RunSummary {
            kind,
            seed,
            budget: *progress.budget(),
            statistics: history.statistics(progress.elapsed()),
            mutation: None,
        };
        debug!("Checkpoint after {} executions", history.len());
        (self.callback)(&summary, history);
    }
}

/// The run controller
///
/// Owns the random context, the generator, the executor and the run history.
/// All executions happen on the caller's thread, one at a time. Progress can
/// be observed from other threads through [`Fuzzer::progress_tracker`].
pub struct Fuzzer<E: Executor = ProcessHarness> {
    config: FuzzConfig,
    context: FuzzContext,
    generator: InputGenerator,
    executor: E,
    history: RunHistory,
    progress: Arc<ProgressTracker>,
    checkpoint: Option<Checkpoint>,
    last_summary: Option<RunSummary>,
}

impl Fuzzer<ProcessHarness> {
    /// Build a fuzzer that runs the configured target program
    pub fn from_config(config: FuzzConfig) -> FuzzResult<Self> {
        let executor = ProcessHarness::from_config(&config);
        Self::with_executor(config, executor)
    }
}

impl<E: Executor> Fuzzer<E> {
    pub fn with_executor(config: FuzzConfig, executor: E) -> FuzzResult<Self> {
        config.validate()?;

        let context = FuzzContext::new(config.seed);
        let generator = InputGenerator::from_config(&config);
        let progress = Arc::new(ProgressTracker::new(config.budget));

        debug!(
            "Fuzzer initialised (grade {}, seed {})",
            config.grade,
            context.seed()
        );

        Ok(Self {
            config,
            context,
            generator,
            executor,
            history: RunHistory::new(),
            progress,
            checkpoint: None,
            last_summary: None,
        })
    }

    /// Call `callback` with the history so far whenever `interval` has
    /// passed since the run started or since the previous call
    pub fn on_checkpoint(
        &mut self,
        interval: Duration,
        callback: impl FnMut(&RunSummary, &RunHistory) + 'static,
    ) {
        self.checkpoint = Some(Checkpoint {
            interval,
            last: Instant::now(),
            callback: Box::new(callback),
        });
    }

    pub fn config(&self) -> &FuzzConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.context.seed()
    }

    pub fn state(&self) -> RunState {
        self.progress.state()
    }

    pub fn history(&self) -> &RunHistory {
        &self.history
    }

    /// Summary of the most recent run, also set when it ended with an error
    pub fn last_summary(&self) -> Option<&RunSummary> {
        self.last_summary.as_ref()
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.progress.snapshot()
    }

    /// Shared handle for observers on other threads
    pub fn progress_tracker(&self) -> Arc<ProgressTracker> {
        Arc::clone(&self.progress)
    }

    /// Generate and execute fresh inputs until the budget is exhausted
    pub fn run(&mut self) -> FuzzResult<RunSummary> {
        self.begin(RunKind::Fuzz, None);

        let result = self.fuzz_loop();
        let summary = self.finish(RunKind::Fuzz, None);
        result.map(|_| summary)
    }

    fn fuzz_loop(&mut self) -> FuzzResult<()> {
        let mut recorder = Recorder {
            executor: &mut self.executor,
            history: &mut self.history,
            progress: &self.progress,
            checkpoint: self.checkpoint.as_mut(),
            kind: RunKind::Fuzz,
            seed: self.context.seed(),
        };

        while !recorder.budget_exhausted() {
            let (map, commands) = self.generator.generate(self.context.rng());
            recorder.record(map, commands, None)?;
        }
        Ok(())
    }

    /// Execute the seed once, then search its single-symbol neighborhood
    /// until the tree or the budget is exhausted
    pub fn mutate_run(
        &mut self,
        seed_map: MapString,
        seed_commands: CommandSequence,
    ) -> FuzzResult<RunSummary> {
        let total = estimated_total(&seed_map, &seed_commands);
        self.begin(RunKind::Mutation, Some(total));

        let mut engine = MutationEngine::new(self.config.mutation.max_depth);
        let result = self.mutation_loop(&mut engine, seed_map, seed_commands);

        let mutation = result.as_ref().ok().map(|search| MutationSummary {
            visited: engine.visited_count() as u64,
            estimated_total: total,
            search: *search,
        });
        let summary = self.finish(RunKind::Mutation, mutation);
        result.map(|_| summary)
    }

    fn mutation_loop(
        &mut self,
        engine: &mut MutationEngine,
        seed_map: MapString,
        seed_commands: CommandSequence,
    ) -> FuzzResult<SearchReport> {
        engine.mark_visited(&seed_map, &seed_commands);
        self.progress.set_visited(engine.visited_count() as u64);

        let mut recorder = Recorder {
            executor: &mut self.executor,
            history: &mut self.history,
            progress: &self.progress,
            checkpoint: self.checkpoint.as_mut(),
            kind: RunKind::Mutation,
            seed: self.context.seed(),
        };

        let seed_iteration = recorder.record(
            seed_map.clone(),
            seed_commands.clone(),
            Some(INITIAL_SETUP_NOTE.to_string()),
        )?;
        let report = engine.search(&seed_map, &seed_commands, seed_iteration, &mut recorder)?;

        if report.end == SearchEnd::Exhausted {
            info!("Mutation run finished before its budget: tree exhausted");
        }
        Ok(report)
    }

    fn begin(&mut self, kind: RunKind, estimated_total: Option<u64>) {
        let budget = *self.progress.budget();
        if budget.is_unbounded() {
            warn!("No limit specified, the fuzzer will run indefinitely!");
        }

        self.history.clear();
        self.last_summary = None;
        self.progress.begin(estimated_total);
        if let Some(checkpoint) = self.checkpoint.as_mut() {
            checkpoint.last = Instant::now();
        }

        info!(
            "Starting {:?} run (seed {}, max iterations {:?}, max time {:?}s)",
            kind,
            self.context.seed(),
            budget.max_iterations,
            budget.max_time_secs
        );
    }

    fn finish(&mut self, kind: RunKind, mutation: Option<MutationSummary>) -> RunSummary {
        self.progress.finish();
        let runtime = self.progress.elapsed();
        let budget = *self.progress.budget();

        info!(
            "Fuzzer finished after {:.2}(/{:?}) seconds | {}(/{:?}) iterations",
            runtime.as_secs_f64(),
            budget.max_time_secs,
            self.history.len(),
            budget.max_iterations
        );

        let summary = RunSummary {
            kind,
            seed: self.context.seed(),
            budget,
            statistics: self.history.statistics(runtime),
            mutation,
        };
        self.last_summary = Some(summary.clone());
        summary
    }
}

/// Executes inputs and appends their records; shared by both loops
struct Recorder<'a, E> {
    executor: &'a mut E,
    history: &'a mut RunHistory,
    progress: &'a ProgressTracker,
    checkpoint: Option<&'a mut Checkpoint>,
    kind: RunKind,
    seed: u64,
}

impl<E: Executor> Recorder<'_, E> {
    /// Execute one input and append its record; returns the iteration number
    fn record(
        &mut self,
        map: MapString,
        commands: CommandSequence,
        note: Option<String>,
    ) -> FuzzResult<u64> {
        let execution = self.executor.execute(&map, &commands)?;
        let iteration = self.progress.next_iteration();

        debug!(
            "Iteration {}: {} in {:?}",
            iteration, execution.outcome, execution.duration
        );

        self.history
            .push(RunRecord::new(iteration, map, commands, execution, note));

        if let Some(checkpoint) = self.checkpoint.as_deref_mut() {
            checkpoint.fire_if_due(self.kind, self.seed, self.progress, self.history);
        }
        Ok(iteration)
    }
}

impl<E: Executor> MutationSink for Recorder<'_, E> {
    fn budget_exhausted(&self) -> bool {
        self.progress.is_budget_exhausted()
    }

    fn execute(
        &mut self,
        map: &MapString,
        commands: &CommandSequence,
        note: String,
    ) -> FuzzResult<u64> {
        self.record(map.clone(), commands.clone(), Some(note))
    }

    fn visited(&mut self, count: usize) {
        self.progress.set_visited(count as u64);
    }
}
