//! Acceptor definitions
//!
//! The serialized form of one acceptor inside a waiters document. Path
//! expressions are kept as strings here; `waitline-core` compiles them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DefinitionError;

/// Outcome an acceptor produces when it matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcceptorState {
    Success,
    Failure,
    /// Matched, but the attempt stays undetermined
    Retry,
}

impl fmt::Display for AcceptorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Retry => write!(f, "retry"),
        }
    }
}

/// Comparator used by an acceptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatcherKind {
    /// Path result equals `expected`
    Path,
    /// Every element of the path result equals `expected`
    PathAll,
    /// At least one element of the path result equals `expected`
    PathAny,
    /// Response (or error) status equals `expected`
    Status,
    /// Error code equals `expected`, or `true`/`false` for any error/success
    Error,
}

impl MatcherKind {
    /// Whether the matcher reads a path expression from `argument`
    pub fn needs_argument(self) -> bool {
        matches!(self, Self::Path | Self::PathAll | Self::PathAny)
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::PathAll => write!(f, "pathAll"),
            Self::PathAny => write!(f, "pathAny"),
            Self::Status => write!(f, "status"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One acceptor as written in a waiters document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptorDefinition {
    pub matcher: MatcherKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
    pub expected: Value,
    pub state: AcceptorState,
}

impl AcceptorDefinition {
    /// Check the matcher/argument/expected combination
    ///
    /// # Errors
    /// Returns `DefinitionError` when a path matcher has no argument, a
    /// `status` matcher expects something other than an integer in
    /// `100..=599`, or an `error` matcher expects something other than a
    /// string or boolean.
    pub fn validate(&self, waiter: &str, index: usize) -> Result<(), DefinitionError> {
        let invalid = |reason: String| DefinitionError::InvalidExpected {
            waiter: waiter.to_string(),
            index,
            reason,
        };

        if self.matcher.needs_argument()
            && self.argument.as_deref().map_or(true, |arg| arg.trim().is_empty())
        {
            return Err(DefinitionError::MissingArgument {
                waiter: waiter.to_string(),
                index,
                matcher: self.matcher.to_string(),
            });
        }

        match self.matcher {
            MatcherKind::Status => match self.expected.as_u64() {
                Some(code) if (100..=599).contains(&code) => Ok(()),
                _ => Err(invalid(format!(
                    "status matcher expects an HTTP status code, got {}",
                    self.expected
                ))),
            },
            MatcherKind::Error => match &self.expected {
                Value::String(code) if !code.is_empty() => Ok(()),
                Value::Bool(_) => Ok(()),
                other => Err(invalid(format!(
                    "error matcher expects an error code or a boolean, got {other}"
                ))),
            },
            MatcherKind::Path | MatcherKind::PathAll | MatcherKind::PathAny => Ok(()),
        }
    }
}
