//! Error types for the load test library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or reporting a load test run.
///
/// Request failures seen while the test is running are never surfaced
/// through this type; they are tallied by the metrics collector instead.
#[derive(Debug, Error)]
pub enum LoadTestError {
    /// A threshold selector or condition could not be parsed
    #[error("Invalid threshold '{expression}': {reason}")]
    InvalidThreshold { expression: String, reason: String },

    /// A configuration value is out of range or malformed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Writing the end-of-test summary failed
    #[error("Failed to write summary to {}: {source}", .path.display())]
    SummaryExport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Summary serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LoadTestError {
    pub fn invalid_threshold(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        LoadTestError::InvalidThreshold {
            expression: expression.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = LoadTestError> = std::result::Result<T, E>;
