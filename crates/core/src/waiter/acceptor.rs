//! Acceptors: rules that map one probe result to an outcome

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use waitline_domain::{AcceptorDefinition, AcceptorState, DefinitionError, MatcherKind, ProbeResult};

use super::path::{json_equals, PathExpr};

type Predicate = Arc<dyn Fn(&ProbeResult) -> bool + Send + Sync>;

/// Comparator of a compiled acceptor
#[derive(Clone)]
pub enum Matcher {
    /// Path result equals `expected`
    Path { expr: PathExpr, expected: Value },
    /// Path result is a non-empty list whose every element equals `expected`
    PathAll { expr: PathExpr, expected: Value },
    /// Path result is a list with at least one element equal to `expected`
    PathAny { expr: PathExpr, expected: Value },
    /// Response status, or error status when the error carries one
    Status(u16),
    /// The probe failed with this error code
    ErrorCode(String),
    /// The probe failed, whatever the code
    AnyError,
    /// The probe succeeded, whatever the response
    NoError,
    /// Programmatic predicate
    Custom(Predicate),
}

impl Matcher {
    /// Build a custom matcher from a closure
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&ProbeResult) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    /// Whether this matcher accepts `result`
    pub fn matches(&self, result: &ProbeResult) -> bool {
        match self {
            Self::Path { expr, expected } => {
                result.as_ref().is_ok_and(|r| json_equals(&expr.evaluate(&r.body), expected))
            }
            Self::PathAll { expr, expected } => result.as_ref().is_ok_and(|r| {
                match expr.evaluate(&r.body) {
                    Value::Array(items) => {
                        !items.is_empty() && items.iter().all(|item| json_equals(item, expected))
                    }
                    _ => false,
                }
            }),
            Self::PathAny { expr, expected } => result.as_ref().is_ok_and(|r| {
                match expr.evaluate(&r.body) {
                    Value::Array(items) => items.iter().any(|item| json_equals(item, expected)),
                    _ => false,
                }
            }),
            Self::Status(code) => match result {
                Ok(response) => response.status == *code,
                Err(error) => error.status == Some(*code),
            },
            Self::ErrorCode(code) => result.as_ref().is_err_and(|e| &e.code == code),
            Self::AnyError => result.is_err(),
            Self::NoError => result.is_ok(),
            Self::Custom(predicate) => predicate(result),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(_) => f.write_str("Custom(..)"),
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path { expr, expected } => write!(f, "path {expr} == {expected}"),
            Self::PathAll { expr, expected } => write!(f, "pathAll {expr} == {expected}"),
            Self::PathAny { expr, expected } => write!(f, "pathAny {expr} == {expected}"),
            Self::Status(code) => write!(f, "status == {code}"),
            Self::ErrorCode(code) => write!(f, "error == {code}"),
            Self::AnyError => f.write_str("any error"),
            Self::NoError => f.write_str("no error"),
            Self::Custom(_) => f.write_str("custom predicate"),
        }
    }
}

/// A compiled acceptor
#[derive(Debug, Clone)]
pub struct Acceptor {
    matcher: Matcher,
    state: AcceptorState,
}

impl Acceptor {
    pub fn new(matcher: Matcher, state: AcceptorState) -> Self {
        Self { matcher, state }
    }

    pub fn success(matcher: Matcher) -> Self {
        Self::new(matcher, AcceptorState::Success)
    }

    pub fn failure(matcher: Matcher) -> Self {
        Self::new(matcher, AcceptorState::Failure)
    }

    pub fn retry(matcher: Matcher) -> Self {
        Self::new(matcher, AcceptorState::Retry)
    }

    /// Compile a document acceptor
    ///
    /// # Errors
    /// Returns `DefinitionError` when the definition fails validation or its
    /// path expression does not parse.
    pub fn compile(
        definition: &AcceptorDefinition,
        waiter: &str,
        index: usize,
    ) -> Result<Self, DefinitionError> {
        definition.validate(waiter, index)?;

        let expected = definition.expected.clone();
        let matcher = match definition.matcher {
            MatcherKind::Path => Matcher::Path { expr: compile_path(definition, waiter, index)?, expected },
            MatcherKind::PathAll => {
                Matcher::PathAll { expr: compile_path(definition, waiter, index)?, expected }
            }
            MatcherKind::PathAny => {
                Matcher::PathAny { expr: compile_path(definition, waiter, index)?, expected }
            }
            MatcherKind::Status => {
                let code = expected
                    .as_u64()
                    .and_then(|code| u16::try_from(code).ok())
                    .ok_or_else(|| DefinitionError::InvalidExpected {
                        waiter: waiter.to_string(),
                        index,
                        reason: format!("status matcher expects an HTTP status code, got {expected}"),
                    })?;
                Matcher::Status(code)
            }
            MatcherKind::Error => match expected {
                Value::Bool(true) => Matcher::AnyError,
                Value::Bool(false) => Matcher::NoError,
                Value::String(code) => Matcher::ErrorCode(code),
                other => {
                    return Err(DefinitionError::InvalidExpected {
                        waiter: waiter.to_string(),
                        index,
                        reason: format!("error matcher expects an error code or a boolean, got {other}"),
                    })
                }
            },
        };

        Ok(Self::new(matcher, definition.state))
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn state(&self) -> AcceptorState {
        self.state
    }

    pub fn matches(&self, result: &ProbeResult) -> bool {
        self.matcher.matches(result)
    }
}

impl fmt::Display for Acceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.matcher, self.state)
    }
}

fn compile_path(
    definition: &AcceptorDefinition,
    waiter: &str,
    index: usize,
) -> Result<PathExpr, DefinitionError> {
    let source = definition.argument.as_deref().unwrap_or_default();
    PathExpr::parse(source).map_err(|e| DefinitionError::InvalidPath {
        waiter: waiter.to_string(),
        index,
        expression: source.to_string(),
        reason: e.to_string(),
    })
}

/// Verdict of an ordered acceptor list for one attempt
///
/// `acceptor` is the index of the acceptor that decided the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    Success { acceptor: usize },
    Failure { acceptor: usize },
    /// No acceptor matched, or a `retry` acceptor matched first
    Undetermined { acceptor: Option<usize> },
}

/// Apply `acceptors` in order; the first match decides
pub fn evaluate(acceptors: &[Acceptor], result: &ProbeResult) -> Evaluation {
    acceptors
        .iter()
        .position(|acceptor| acceptor.matches(result))
        .map_or(Evaluation::Undetermined { acceptor: None }, |index| {
            match acceptors[index].state {
                AcceptorState::Success => Evaluation::Success { acceptor: index },
                AcceptorState::Failure => Evaluation::Failure { acceptor: index },
                AcceptorState::Retry => Evaluation::Undetermined { acceptor: Some(index) },
            }
        })
}
