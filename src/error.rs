//! Error taxonomy for the scan orchestrator
//!
//! Only `ScanError` crosses the coordinator boundary. Everything below the
//! task boundary is recovered locally and recorded on the scan outcome.

use std::time::Duration;

use crate::models::FailureKind;
use crate::oracle::OracleError;

/// Errors that abort a scan run
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Unknown pillar, empty pillar set or similar; raised before any task starts
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Persistence error: {0:#}")]
    Persistence(anyhow::Error),
}

/// Why a single assessment task produced no pillar score
#[derive(Debug, Clone, thiserror::Error)]
pub enum TaskFailure {
    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(OracleError),

    #[error("Oracle timed out after {}ms", .0.as_millis())]
    OracleTimeout(Duration),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Task cancelled before completion")]
    Cancelled,

    #[error("Task aborted: {0}")]
    Aborted(String),
}

impl TaskFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            TaskFailure::OracleUnavailable(_) => FailureKind::OracleUnavailable,
            TaskFailure::OracleTimeout(_) => FailureKind::OracleTimeout,
            TaskFailure::Parse(_) => FailureKind::Parse,
            TaskFailure::Cancelled => FailureKind::Cancelled,
            TaskFailure::Aborted(_) => FailureKind::Aborted,
        }
    }
}

/// The oracle response could not be turned into any assessment result
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} (response began: {snippet:?})")]
pub struct ParseError {
    pub message: String,
    /// First 200 characters of the raw response
    pub snippet: String,
}

pub const SNIPPET_CHARS: usize = 200;

impl ParseError {
    pub fn new(message: impl Into<String>, raw: &str) -> Self {
        Self {
            message: message.into(),
            snippet: raw.chars().take(SNIPPET_CHARS).collect(),
        }
    }
}

/// One array element rejected by the parser; logged, never propagated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("element is not a JSON object")]
    NotAnObject,

    #[error("missing or empty control_id")]
    MissingControlId,

    #[error("missing status for control {0}")]
    MissingStatus(String),

    #[error("unrecognised status {status:?} for control {control_id}")]
    UnknownStatus { control_id: String, status: String },

    #[error("duplicate control_id {0}")]
    DuplicateControlId(String),
}

/// Invalid environment configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set. Please set it in .env or your environment.")]
    Missing(&'static str),

    #[error("Invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
