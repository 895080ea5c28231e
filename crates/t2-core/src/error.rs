// crates/t2-core/src/error.rs - Error taxonomy for one CLI invocation
//
// Every fatal path converges on the Closer, so the errors here carry just
// enough to pick a log level and an exit code:
//
// - Parse / UnknownCommand / InvalidValue / Validation / Unresolved are
//   diagnostics: plain messages, warning level, exit code 1.
// - Operation is whatever an external operation rejected with, reported at
//   error level with the operation's own code when it has one.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::preferences::PreferenceError;

/// Exit code carried by a failed operation
///
/// Operations may report symbolic codes ("red") as well as numbers. Strings
/// that are valid integers are normalised to `Numeric`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Numeric(i32),
    Named(String),
}

impl ErrorCode {
    /// Generic failure code
    pub const FAILURE: ErrorCode = ErrorCode::Numeric(1);

    pub fn parse(value: &str) -> Self {
        match value.trim().parse::<i32>() {
            Ok(n) => Self::Numeric(n),
            Err(_) => Self::Named(value.to_string()),
        }
    }

    /// `0` or an empty name, neither of which can describe a failure
    pub fn is_unset(&self) -> bool {
        match self {
            Self::Numeric(n) => *n == 0,
            Self::Named(s) => s.trim().is_empty(),
        }
    }

    /// Process exit status for this code
    ///
    /// Exit statuses are integers, so a named code degrades to 1 here.
    pub fn exit_status(&self) -> i32 {
        match self {
            Self::Numeric(n) => *n,
            Self::Named(_) => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(n) => write!(f, "{}", n),
            Self::Named(s) => write!(f, "{}", s),
        }
    }
}

impl From<i32> for ErrorCode {
    fn from(value: i32) -> Self {
        Self::Numeric(value)
    }
}

impl From<&str> for ErrorCode {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<String> for ErrorCode {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

/// Rejection value of an external operation
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct OperationError {
    pub message: String,
    pub code: Option<ErrorCode>,
}

impl OperationError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code<C: Into<ErrorCode>>(mut self, code: C) -> Self {
        self.code = Some(code.into());
        self
    }
}

impl From<anyhow::Error> for OperationError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the context chain on one line
        Self::new(format!("{:#}", err))
    }
}

impl From<std::io::Error> for OperationError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Errors that end an invocation
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Malformed bracket group, unknown flag, stray positional
    #[error("{0}")]
    Parse(String),

    /// Value outside an enumerated set
    #[error("{flag} Invalid")]
    InvalidValue { flag: String, value: String },

    /// Value that could not be coerced or combined
    #[error("{flag} Invalid: {detail}")]
    Validation { flag: String, detail: String },

    /// Required value absent with no fallback available
    #[error("Cannot determine {0}")]
    Unresolved(&'static str),

    #[error("Unable to read preferences: {0}")]
    Preferences(#[from] PreferenceError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

impl CliError {
    pub fn validation<F: Into<String>, D: Into<String>>(flag: F, detail: D) -> Self {
        Self::Validation {
            flag: flag.into(),
            detail: detail.into(),
        }
    }

    /// Whether this is a plain diagnostic rather than a failed operation
    pub fn is_diagnostic(&self) -> bool {
        !matches!(self, Self::Preferences(_) | Self::Operation(_))
    }
}

/// Result type for dispatch-level operations
pub type CliResult<T> = Result<T, CliError>;
