use crate::budget::Budget;
use crate::{FuzzError, FuzzResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder in target arguments that is replaced by the input artifact path
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Strictness level of generated maps
///
/// Each grade refines the previous one:
/// - `Zero`: cells are `0` or `1`
/// - `One`: cells are ASCII letters
/// - `Two`: cells are valid tiles
/// - `Three`: valid tiles, exactly one player, at least one food
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Grade {
    Zero,
    One,
    Two,
    Three,
}

impl TryFrom<u8> for Grade {
    type Error = FuzzError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Grade::Zero),
            1 => Ok(Grade::One),
            2 => Ok(Grade::Two),
            3 => Ok(Grade::Three),
            other => Err(FuzzError::config(format!(
                "correctness grade must be between 0 and 3, got {}",
                other
            ))),
        }
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        match grade {
            Grade::Zero => 0,
            Grade::One => 1,
            Grade::Two => 2,
            Grade::Three => 3,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Upper bounds for generated map dimensions (inclusive)
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSize {
    pub width: usize,
    pub height: usize,
}

/// How the target program is invoked
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Executable to run
    pub program: String,

    /// Arguments placed before the command sequence. `{input}` is replaced by
    /// the input artifact path.
    pub args: Vec<String>,

    /// Where the map is written before each execution.
    /// Defaults to `<output_dir>/input.map`.
    pub input_path: Option<PathBuf>,

    /// Wall-clock limit for one execution
    pub timeout_ms: u64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            program: "java".to_string(),
            args: vec![
                "-jar".to_string(),
                "jpacman/jpacman-3.0.1.jar".to_string(),
                INPUT_PLACEHOLDER.to_string(),
            ],
            input_path: None,
            timeout_ms: 5_000,
        }
    }
}

impl TargetConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MutationConfig {
    /// Stop descending below this many substitutions from the seed
    pub max_depth: Option<usize>,
}

/// Complete fuzzer configuration
///
/// Every field has a default, so a config file only needs the values it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzConfig {
    pub grade: Grade,
    pub max_map_size: MapSize,
    pub max_sequence_length: usize,

    /// Replace the last generated command with `exit`
    pub force_exit_command: bool,

    /// RNG seed. A random seed is drawn (and logged) when unset.
    pub seed: Option<u64>,

    pub target: TargetConfig,
    pub budget: Budget,
    pub mutation: MutationConfig,

    /// Directory for the input artifact and reports
    pub output_dir: PathBuf,

    /// Write logs to this file instead of stderr
    pub log_file: Option<PathBuf>,

    /// Write an interim report this often while a run is in progress
    pub partial_report_interval_secs: Option<u64>,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            grade: Grade::Three,
            max_map_size: MapSize {
                width: 10,
                height: 10,
            },
            max_sequence_length: 20,
            force_exit_command: false,
            seed: None,
            target: TargetConfig::default(),
            budget: Budget::default(),
            mutation: MutationConfig::default(),
            output_dir: PathBuf::from("data/output"),
            log_file: None,
            partial_report_interval_secs: None,
        }
    }
}

impl FuzzConfig {
    /// Read, parse and validate a JSON config file
    pub fn load(path: &Path) -> FuzzResult<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| FuzzError::io(path, source))?;
        let config: FuzzConfig =
            serde_json::from_str(&contents).map_err(|source| FuzzError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FuzzResult<()> {
        if self.max_map_size.width == 0 || self.max_map_size.height == 0 {
            return Err(FuzzError::config(format!(
                "max_map_size must be at least 1x1, got {}x{}",
                self.max_map_size.width, self.max_map_size.height
            )));
        }
        if self.max_sequence_length == 0 {
            return Err(FuzzError::config(
                "max_sequence_length must be at least 1",
            ));
        }
        if self.target.program.trim().is_empty() {
            return Err(FuzzError::config("target.program must not be empty"));
        }
        if self.target.timeout_ms == 0 {
            return Err(FuzzError::config("target.timeout_ms must be positive"));
        }
        if self.mutation.max_depth == Some(0) {
            return Err(FuzzError::config(
                "mutation.max_depth must be at least 1 when set",
            ));
        }
        if self.partial_report_interval_secs == Some(0) {
            return Err(FuzzError::config(
                "partial_report_interval_secs must be at least 1 when set",
            ));
        }
        self.budget.validate()
    }

    pub fn partial_report_interval(&self) -> Option<Duration> {
        self.partial_report_interval_secs.map(Duration::from_secs)
    }

    pub fn input_path(&self) -> PathBuf {
        self.target
            .input_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join("input.map"))
    }
}
