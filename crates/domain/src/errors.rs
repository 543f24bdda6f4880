//! Error types used throughout the workspace

use thiserror::Error;

/// Main error type for Waitline configuration and loading
#[derive(Error, Debug)]
pub enum WaitlineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Definition error: {0}")]
    Definition(#[from] DefinitionError),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type alias for Waitline operations
pub type Result<T> = std::result::Result<T, WaitlineError>;

/// A waiters document or a single waiter definition failed validation
///
/// `index` fields are 0-based positions in the waiter's acceptor list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("Failed to parse waiters document: {0}")]
    Parse(String),

    #[error("Unsupported waiters document version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Waiter name '{0}' is empty or contains no identifier characters")]
    InvalidName(String),

    #[error("Waiter '{waiter}' has no operation")]
    MissingOperation { waiter: String },

    #[error("Waiter '{waiter}' has no acceptors")]
    NoAcceptors { waiter: String },

    #[error("Waiter '{waiter}' must allow at least one attempt")]
    ZeroMaxAttempts { waiter: String },

    #[error("Waiter '{waiter}' acceptor {index}: matcher '{matcher}' requires an argument")]
    MissingArgument { waiter: String, index: usize, matcher: String },

    #[error("Waiter '{waiter}' acceptor {index}: invalid expected value: {reason}")]
    InvalidExpected { waiter: String, index: usize, reason: String },

    #[error("Waiter '{waiter}' acceptor {index}: invalid path '{expression}': {reason}")]
    InvalidPath { waiter: String, index: usize, expression: String, reason: String },
}

impl DefinitionError {
    /// Name of the waiter the error refers to, if any
    pub fn waiter(&self) -> Option<&str> {
        match self {
            Self::Parse(_) | Self::UnsupportedVersion { .. } => None,
            Self::InvalidName(name) => Some(name),
            Self::MissingOperation { waiter }
            | Self::NoAcceptors { waiter }
            | Self::ZeroMaxAttempts { waiter }
            | Self::MissingArgument { waiter, .. }
            | Self::InvalidExpected { waiter, .. }
            | Self::InvalidPath { waiter, .. } => Some(waiter),
        }
    }
}

impl From<serde_json::Error> for DefinitionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
