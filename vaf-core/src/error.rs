//! Error types for the vaf-core library.
//!
//! Failures are classified so callers can tell an environment problem
//! (missing tool) from a data problem (tool ran and failed) from a
//! configuration problem. The batch loop in `experiment` contains all of
//! these at the per-task level; only unclassified errors abort a run.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Custom error types for vaf-core.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to parse configuration file: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Required tool '{0}' not found in PATH")]
    DependencyNotFound(String),

    #[error("Failed to start '{tool}': {source}")]
    CommandStart {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{tool}' failed with {status}; check the log: {log:?}")]
    CommandFailed {
        tool: String,
        status: ExitStatus,
        log: PathBuf,
    },

    #[error("'{tool}' exceeded the {limit_secs}s invocation timeout; check the log: {log:?}")]
    CommandTimeout {
        tool: String,
        limit_secs: u64,
        log: PathBuf,
    },

    #[error("Codec '{0}' is not in the encoder mapping table")]
    UnsupportedCodec(String),

    #[error("Test-source pattern '{0}' is not supported")]
    UnsupportedPattern(String),

    #[error("Dataset error: {0}")]
    Dataset(#[from] csv::Error),
}

/// Result type for vaf-core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// True when the error means the tool binary itself is absent. Callers
    /// surface this prominently: every subsequent task will likely fail the
    /// same way.
    pub fn is_environment_problem(&self) -> bool {
        matches!(self, CoreError::DependencyNotFound(_))
    }
}
