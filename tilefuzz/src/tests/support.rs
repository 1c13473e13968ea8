use crate::harness::{Execution, Executor, Outcome};
use crate::input::{CommandSequence, MapString};
use crate::{FuzzConfig, FuzzError, FuzzResult};
use std::time::Duration;

type OutcomeFn = Box<dyn FnMut(&MapString, &CommandSequence) -> FuzzResult<Outcome> + Send>;

/// In-process executor that remembers every input it was given
pub struct FakeExecutor {
    pub calls: Vec<(MapString, CommandSequence)>,
    outcome: OutcomeFn,
}

impl FakeExecutor {
    pub fn exiting_with(code: i32) -> Self {
        Self::with(move |_, _| Ok(Outcome::Exited(code)))
    }

    pub fn with(
        outcome: impl FnMut(&MapString, &CommandSequence) -> FuzzResult<Outcome> + Send + 'static,
    ) -> Self {
        Self {
            calls: Vec::new(),
            outcome: Box::new(outcome),
        }
    }

    pub fn failing() -> Self {
        Self::with(|_, _| {
            Err(FuzzError::Launch {
                program: "missing-target".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            })
        })
    }
}

impl Executor for FakeExecutor {
    fn execute(&mut self, map: &MapString, commands: &CommandSequence) -> FuzzResult<Execution> {
        self.calls.push((map.clone(), commands.clone()));
        let outcome = (self.outcome)(map, commands)?;
        Ok(Execution {
            outcome,
            output: format!("ran {}", commands),
            duration: Duration::from_millis(1),
        })
    }
}

pub fn seeded_config(seed: u64) -> FuzzConfig {
    FuzzConfig {
        seed: Some(seed),
        ..FuzzConfig::default()
    }
}
