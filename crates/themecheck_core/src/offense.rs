//! Offenses reported by checks and the severity model used to rank them.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use themecheck_syntax::Span;

/// How serious an offense is.
///
/// Severities are ordered from most to least severe, so sorting offenses by severity
/// puts errors first.
#[cfg_attr(feature = "schema", derive(schemars::JsonSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    /// The numeric level of the severity, `0` being the most severe.
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        Some(match level {
            0 => Severity::Error,
            1 => Severity::Warning,
            2 => Severity::Info,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" | "suggestion" | "style" => Ok(Severity::Info),
            _ => Err(()),
        }
    }
}

/// A single diagnostic produced by a check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Offense {
    /// The code of the check which reported this offense.
    pub code: SmolStr,
    /// The effective severity, after configuration overrides.
    pub severity: Severity,
    pub message: String,
    pub uri: String,
    pub start_index: u32,
    pub end_index: u32,
}

impl Offense {
    pub fn span(&self) -> Span {
        Span::new(self.start_index, self.end_index)
    }

    /// The key offenses are sorted by: position, then severity, then code.
    pub fn sort_key(&self) -> (u32, u32, Severity, &str) {
        (self.start_index, self.end_index, self.severity, &self.code)
    }
}

impl fmt::Display for Offense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}..{}: {} [{}] {}",
            self.uri, self.start_index, self.end_index, self.severity, self.code, self.message
        )
    }
}

/// The overall result of running a single check or linting a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// One or more offenses were errors.
    Failure,
    /// One or more offenses were warnings, but none were errors.
    Warning,
    /// No errors or warnings, info offenses may have been reported.
    Success,
}

impl<T> From<T> for Outcome
where
    T: IntoIterator,
    T::Item: Borrow<Offense>,
{
    fn from(offenses: T) -> Self {
        let mut outcome = Outcome::Success;
        for offense in offenses {
            match offense.borrow().severity {
                Severity::Error => outcome = Outcome::Failure,
                Severity::Warning if outcome != Outcome::Failure => outcome = Outcome::Warning,
                _ => {}
            }
        }
        outcome
    }
}

impl Outcome {
    pub fn merge(outcomes: impl IntoIterator<Item = impl Borrow<Outcome>>) -> Outcome {
        let mut overall = Outcome::Success;
        for outcome in outcomes {
            match outcome.borrow() {
                Outcome::Failure => overall = Outcome::Failure,
                Outcome::Warning if overall != Outcome::Failure => overall = Outcome::Warning,
                _ => {}
            }
        }
        overall
    }
}
