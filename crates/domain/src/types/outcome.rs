//! Terminal outcomes of a poll session

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::probe::{ProbeResponse, ProbeResult};

/// A session that reached a success condition
#[derive(Debug, Clone, PartialEq)]
pub struct WaitSuccess {
    /// Response that satisfied the waiter
    ///
    /// `None` when a success acceptor matched an error result, or when a hook
    /// forced success without a value before any probe succeeded.
    pub response: Option<ProbeResponse>,
    /// Probes performed
    pub attempts: u32,
    /// Time spent suspended between attempts
    pub total_wait: Duration,
    /// Wall-clock duration of the session
    pub elapsed: Duration,
}

/// Why a session ended without success
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A `failure` acceptor matched
    Acceptor,
    /// The attempt budget ran out
    Exhausted,
    /// A hook forced failure
    Forced,
    /// The session's cancellation token fired
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acceptor => write!(f, "acceptor failure"),
            Self::Exhausted => write!(f, "attempts exhausted"),
            Self::Forced => write!(f, "forced failure"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A session that ended without success
#[derive(Debug, Clone, PartialEq)]
pub struct WaitFailure {
    pub kind: FailureKind,
    /// Human-readable diagnostic
    pub reason: String,
    /// Probes performed before termination
    pub attempts: u32,
    /// Most recent probe result, if any probe ran
    pub last_result: Option<ProbeResult>,
}

impl WaitFailure {
    /// Failures that came from a hook or the cancellation token rather than
    /// from the remote resource
    pub fn is_cancellation(&self) -> bool {
        matches!(self.kind, FailureKind::Forced | FailureKind::Cancelled)
    }
}

impl fmt::Display for WaitFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} after {} attempt(s): {}", self.kind, self.attempts, self.reason)
    }
}

/// Result of running a poll session
pub type WaitOutcome = Result<WaitSuccess, WaitFailure>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::probe::ProbeError;

    #[test]
    fn test_wait_failure_display() {
        let failure = WaitFailure {
            kind: FailureKind::Exhausted,
            reason: "max attempts (3) exceeded".to_string(),
            attempts: 3,
            last_result: Some(Err(ProbeError::new("Throttling", "slow down"))),
        };
        assert_eq!(
            failure.to_string(),
            "attempts exhausted after 3 attempt(s): max attempts (3) exceeded"
        );
        assert!(!failure.is_cancellation());
    }

    #[test]
    fn test_cancellation_kinds() {
        for (kind, expected) in [
            (FailureKind::Acceptor, false),
            (FailureKind::Exhausted, false),
            (FailureKind::Forced, true),
            (FailureKind::Cancelled, true),
        ] {
            let failure =
                WaitFailure { kind, reason: String::new(), attempts: 0, last_result: None };
            assert_eq!(failure.is_cancellation(), expected);
        }
    }
}
