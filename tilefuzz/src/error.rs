use std::path::PathBuf;
use thiserror::Error;

/// Error types for the fuzzing engine
///
/// Only fatal conditions are errors. Timeouts, crashes and non-zero exits of
/// the target are recorded as [`crate::Outcome`]s instead.
#[derive(Error, Debug)]
pub enum FuzzError {
    /// Invalid or inconsistent configuration, reported before any iteration runs
    #[error("Configuration error: {0}")]
    Config(String),

    /// The target program could not be started
    #[error("Failed to launch target '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Input artifact or file access failure
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed configuration file
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A seed map or command sequence that cannot be used
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl FuzzError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error belongs to the configuration class that aborts a run
    /// before it starts.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            FuzzError::Config(_) | FuzzError::Json { .. } | FuzzError::InvalidInput(_)
        )
    }
}
