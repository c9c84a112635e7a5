//! Error — the single error type shared by every inspection operation.

use std::path::PathBuf;
use thiserror::Error;

use crate::threshold::Metric;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Log not found or unreadable: {path}: {source}")]
    LogUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed duration in log line: {text:?}")]
    MalformedDuration { text: String },

    #[error(
        "{mode} log should not contain `ERROR' lines that are not allow-listed \
         ({violations} found, first at line {line_number}: `{line}'). See {hint}"
    )]
    UnexpectedErrorLine {
        mode: String,
        method: String,
        line_number: u64,
        line: String,
        violations: usize,
        hint: String,
    },

    #[error("{message}")]
    ThresholdExceeded {
        metric: Metric,
        measured: u64,
        threshold: u64,
        message: String,
    },

    #[error("Unexpected mode: {0}")]
    UnknownMode(String),

    #[error("Unexpected platform: {0}")]
    UnknownPlatform(String),

    #[error("Threshold not configured: {key}")]
    MissingThreshold { key: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type InspectResult<T> = Result<T, InspectError>;

impl InspectError {
    /// True for failures a test harness reports as a failed assertion rather
    /// than a broken setup.
    pub fn is_check_failure(&self) -> bool {
        matches!(
            self,
            InspectError::UnexpectedErrorLine { .. } | InspectError::ThresholdExceeded { .. }
        )
    }
}
