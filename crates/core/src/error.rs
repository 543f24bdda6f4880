//! Caller-facing waiter errors

use std::time::Duration;

use thiserror::Error;
use waitline_common::{ErrorClassification, ErrorSeverity};
use waitline_domain::{DefinitionError, FailureKind, WaitFailure};

/// Errors returned by `WaiterClient::wait_until` and registry lookups
#[derive(Debug, Clone, Error)]
pub enum WaiterError {
    /// No waiter is registered under the requested name; no probe was made
    #[error("no such waiter '{name}'; registered waiters: {}", list_names(.available))]
    NoSuchWaiter { name: String, available: Vec<String> },

    /// The poll session ended without success
    #[error("waiter '{waiter}' failed: {failure}")]
    WaiterFailed { waiter: String, failure: WaitFailure },

    /// A definition could not be compiled into a condition
    #[error(transparent)]
    InvalidDefinition(#[from] DefinitionError),
}

fn list_names(names: &[String]) -> String {
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(", ")
    }
}

impl WaiterError {
    /// True for failures ended by a hook or a cancellation token rather than
    /// by the remote resource
    pub fn is_cancelled(&self) -> bool {
        self.failure().is_some_and(WaitFailure::is_cancellation)
    }

    pub fn failure(&self) -> Option<&WaitFailure> {
        match self {
            Self::WaiterFailed { failure, .. } => Some(failure),
            Self::NoSuchWaiter { .. } | Self::InvalidDefinition(_) => None,
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        self.failure().map(|failure| failure.kind)
    }
}

impl ErrorClassification for WaiterError {
    fn is_retryable(&self) -> bool {
        // A fresh session may still observe success after running out of attempts
        matches!(self.kind(), Some(FailureKind::Exhausted))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoSuchWaiter { .. } => ErrorSeverity::Error,
            Self::InvalidDefinition(_) => ErrorSeverity::Critical,
            Self::WaiterFailed { failure, .. } => match failure.kind {
                FailureKind::Acceptor => ErrorSeverity::Error,
                FailureKind::Exhausted => ErrorSeverity::Warning,
                FailureKind::Forced | FailureKind::Cancelled => ErrorSeverity::Info,
            },
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self, Self::InvalidDefinition(_))
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
