use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by an extractor adapter
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Extractor executable could not be started
    #[error("Failed to start {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    /// Extractor ran and reported a failure
    #[error("Extractor failed (exit code {code:?}): {message}")]
    Failed { code: Option<i32>, message: String },

    /// Extractor output could not be understood
    #[error("Invalid extractor output: {0}")]
    InvalidOutput(String),

    /// Download reported success but no file was produced
    #[error("Extractor did not report an output file")]
    MissingOutput,

    /// Watchdog expired
    #[error("Extractor did not respond within {0} seconds")]
    TimedOut(u64),

    /// Adapter panicked inside a worker
    #[error("Extractor panicked: {0}")]
    Panicked(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse extractor JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractorError {
    pub fn failed(code: Option<i32>, message: impl Into<String>) -> Self {
        Self::Failed {
            code,
            message: message.into(),
        }
    }
}
