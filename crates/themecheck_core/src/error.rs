//! Errors raised by checks and the failure channel reported alongside offenses.

use smol_str::SmolStr;
use std::fmt;
use thiserror::Error;

/// An error raised by a check while it is created or while it handles a node.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The configured options of a check could not be deserialized into its option struct.
    #[error("invalid options for `{code}`: {source}")]
    InvalidOptions {
        code: SmolStr,
        #[source]
        source: serde_json::Error,
    },
    /// A check reported an offense whose start is past its end.
    #[error("reported an offense spanning {start}..{end}, its start is past its end")]
    InvalidRange { start: u32, end: u32 },
    /// A check panicked, the payload is the panic message if it was a string.
    #[error("check panicked: {0}")]
    Panicked(String),
    #[error("{0}")]
    Custom(String),
}

impl CheckError {
    pub fn custom(message: impl Into<String>) -> Self {
        CheckError::Custom(message.into())
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        CheckError::Panicked(message)
    }
}

/// The result of a single check callback.
pub type CheckResult = Result<(), CheckError>;

/// The point of a check's lifecycle at which it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailurePhase {
    Create,
    /// Handling a node, holds the debug name of the node kind.
    Node(String),
    End,
}

impl fmt::Display for FailurePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePhase::Create => f.write_str("create"),
            FailurePhase::Node(kind) => write!(f, "node `{}`", kind),
            FailurePhase::End => f.write_str("end"),
        }
    }
}

/// A check which failed during a run. Failures are isolated to the check which raised
/// them and are reported next to the offenses of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    pub code: SmolStr,
    pub phase: FailurePhase,
    pub message: String,
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{}` failed during {}: {}", self.code, self.phase, self.message)
    }
}
