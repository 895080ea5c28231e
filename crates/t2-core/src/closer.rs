// crates/t2-core/src/closer.rs - Uniform termination of an invocation
//
// The Closer is consumed by whichever close method runs, so one invocation
// can close at most once, and `Dispatcher::finish` returns the resulting
// Termination so it always closes at least once.
//
// Exit codes:
//   success                        -> 0
//   plain diagnostic               -> warn,  1
//   operation error                -> error, error.code or 1
//   explicit code override         -> wins over error.code

use tracing::{error, info, warn};

use crate::error::{CliError, ErrorCode, OperationError};

/// Sink for user-facing messages
pub trait Console: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Console that forwards to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingConsole;

impl Console for TracingConsole {
    fn info(&self, message: &str) {
        info!("{}", message);
    }

    fn warn(&self, message: &str) {
        warn!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }
}

/// Why an invocation failed
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// Plain diagnostic text
    Message(String),
    /// Structured error, possibly carrying its own exit code
    Error(OperationError),
}

impl From<&str> for FailureReason {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<String> for FailureReason {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<OperationError> for FailureReason {
    fn from(err: OperationError) -> Self {
        Self::Error(err)
    }
}

impl From<CliError> for FailureReason {
    fn from(err: CliError) -> Self {
        match err {
            CliError::Operation(err) => Self::Error(err),
            err if err.is_diagnostic() => Self::Message(err.to_string()),
            err => Self::Error(OperationError::new(err.to_string())),
        }
    }
}

/// Final state of an invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    Success,
    Failure(ErrorCode),
}

impl Termination {
    /// Code as reported, including symbolic codes
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Success => ErrorCode::Numeric(0),
            Self::Failure(code) => code.clone(),
        }
    }

    /// Status handed to the operating system
    pub fn exit_status(&self) -> i32 {
        self.code().exit_status()
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Single-use terminator for one invocation
pub struct Closer<'a> {
    console: &'a dyn Console,
}

impl<'a> Closer<'a> {
    pub fn new(console: &'a dyn Console) -> Self {
        Self { console }
    }

    /// Finish successfully, optionally reporting a result line
    pub fn close_successful(self, result: Option<&str>) -> Termination {
        if let Some(result) = result.filter(|r| !r.is_empty()) {
            self.console.info(result);
        }
        Termination::Success
    }

    /// Finish with a failure
    ///
    /// `code` overrides any code carried by the error itself. A code of `0`
    /// (or an empty name) counts as no code, so a failure never exits 0.
    pub fn close_failed<R: Into<FailureReason>>(self, reason: R, code: Option<ErrorCode>) -> Termination {
        let carried = match reason.into() {
            FailureReason::Message(message) => {
                self.console.warn(&message);
                None
            }
            FailureReason::Error(err) => {
                self.console.error(&err.to_string());
                err.code
            }
        };

        let code = code
            .filter(|c| !c.is_unset())
            .or(carried.filter(|c| !c.is_unset()))
            .unwrap_or(ErrorCode::FAILURE);
        Termination::Failure(code)
    }
}
