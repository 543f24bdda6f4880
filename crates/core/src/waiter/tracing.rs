//! Structured events for poll sessions
//!
//! Emitted through the standard `tracing` macros inside the session span
//! opened by `Waiter::run`.

use std::time::Duration;

use tracing::{debug, info, warn};
use waitline_domain::{FailureKind, MaxAttempts};

/// Records the lifecycle of one poll session
#[derive(Debug)]
pub struct WaitSpan {
    waiter: String,
    max_attempts: MaxAttempts,
}

impl WaitSpan {
    /// Start recording a session
    pub fn start(waiter: &str, max_attempts: MaxAttempts, interval: Duration) -> Self {
        debug!(
            waiter = waiter,
            max_attempts = %max_attempts,
            interval_ms = interval.as_millis() as u64,
            "Starting waiter"
        );
        Self { waiter: waiter.to_string(), max_attempts }
    }

    /// Record a probe about to run
    pub fn record_attempt(&self, attempt: u32) {
        debug!(
            waiter = %self.waiter,
            attempt = attempt,
            max_attempts = %self.max_attempts,
            "Probing"
        );
    }

    /// Record an undetermined attempt
    pub fn record_undetermined(&self, attempt: u32, error: Option<&str>) {
        if let Some(error) = error {
            debug!(waiter = %self.waiter, attempt = attempt, error = %error, "Probe failed, condition undetermined");
        } else {
            debug!(waiter = %self.waiter, attempt = attempt, "Condition undetermined");
        }
    }

    /// Record a suspension before the next attempt
    pub fn record_wait(&self, attempt: u32, delay: Duration) {
        debug!(
            waiter = %self.waiter,
            attempt = attempt,
            delay_ms = delay.as_millis() as u64,
            "Waiting before next attempt"
        );
    }

    /// Record a successful session
    pub fn record_success(&self, attempts: u32, total_wait: Duration, forced: bool) {
        info!(
            waiter = %self.waiter,
            attempts = attempts,
            total_wait_ms = total_wait.as_millis() as u64,
            forced = forced,
            "Waiter succeeded"
        );
    }

    /// Record a session that ended without success
    pub fn record_failure(&self, kind: FailureKind, attempts: u32, reason: &str) {
        match kind {
            FailureKind::Cancelled | FailureKind::Forced => info!(
                waiter = %self.waiter,
                attempts = attempts,
                kind = %kind,
                reason = %reason,
                "Waiter stopped"
            ),
            FailureKind::Acceptor | FailureKind::Exhausted => warn!(
                waiter = %self.waiter,
                attempts = attempts,
                max_attempts = %self.max_attempts,
                kind = %kind,
                reason = %reason,
                "Waiter failed"
            ),
        }
    }
}
