//! Poll loop
//!
//! A [`Waiter`] is one poll session over a condition. Each cycle:
//!
//! 1. stop with `Exhausted` if the attempt budget is used up
//! 2. run the before-attempt hooks (they may end the session)
//! 3. run the probe once
//! 4. evaluate the acceptors; success or failure ends the session
//! 5. stop with `Exhausted` if that was the last allowed attempt
//! 6. run the before-wait hooks, then suspend for the interval
//!
//! Cancellation is observed before each attempt, while the probe is in
//! flight and while suspended.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::instrument;
use uuid::Uuid;
use waitline_common::time::{sleep_or_cancel, SleepOutcome, Sleeper, TokioSleeper};
use waitline_domain::{
    FailureKind, MaxAttempts, ProbeResponse, ProbeResult, WaitFailure, WaitOutcome, WaitSuccess,
};

use super::acceptor::Evaluation;
use super::condition::Condition;
use super::hooks::{dispatch, Dispatch, Hook, HookAction};
use super::tracing::WaitSpan;

/// One poll session over a condition
///
/// Starts with the condition's interval and attempt budget; both can be
/// overridden before [`Waiter::run`].
pub struct Waiter {
    condition: Arc<Condition>,
    interval: Duration,
    max_attempts: MaxAttempts,
    before_attempt: Vec<Hook>,
    before_wait: Vec<Hook>,
    cancellation: CancellationToken,
    sleeper: Arc<dyn Sleeper>,
}

impl Waiter {
    pub fn new(condition: Arc<Condition>) -> Self {
        Self {
            interval: condition.interval(),
            max_attempts: condition.max_attempts(),
            condition,
            before_attempt: Vec::new(),
            before_wait: Vec::new(),
            cancellation: CancellationToken::new(),
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> MaxAttempts {
        self.max_attempts
    }

    /// Delay between attempts; zero disables suspension
    pub fn set_interval(&mut self, interval: Duration) -> &mut Self {
        self.interval = interval;
        self
    }

    pub fn set_max_attempts(&mut self, max_attempts: MaxAttempts) -> &mut Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Install a hook called with the attempt number before each probe
    pub fn before_attempt<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnMut(u32) -> HookAction + Send + 'static,
    {
        self.before_attempt.push(Box::new(hook));
        self
    }

    /// Install a hook called with the attempt number before each suspension
    pub fn before_wait<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnMut(u32) -> HookAction + Send + 'static,
    {
        self.before_wait.push(Box::new(hook));
        self
    }

    /// Stop the session when `token` is cancelled
    pub fn with_cancellation(&mut self, token: CancellationToken) -> &mut Self {
        self.cancellation = token;
        self
    }

    pub fn with_sleeper(&mut self, sleeper: Arc<dyn Sleeper>) -> &mut Self {
        self.sleeper = sleeper;
        self
    }

    /// Token observed by this session; cancelling it ends the session
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Poll until the condition is decided
    ///
    /// `probe` receives the 1-indexed attempt number.
    #[instrument(
        name = "waiter.poll",
        skip_all,
        fields(
            waiter = %self.condition.name(),
            operation = %self.condition.operation(),
            session = %Uuid::now_v7(),
        )
    )]
    pub async fn run<F, Fut>(mut self, mut probe: F) -> WaitOutcome
    where
        F: FnMut(u32) -> Fut + Send,
        Fut: Future<Output = ProbeResult> + Send,
    {
        let mut session = Session::new(
            WaitSpan::start(self.condition.name(), self.max_attempts, self.interval),
        );
        let token = self.cancellation.clone();

        loop {
            if token.is_cancelled() {
                return session.cancelled();
            }
            if self.max_attempts.is_exhausted(session.attempts) {
                return session.exhausted(self.max_attempts);
            }

            let attempt = session.attempts.saturating_add(1);
            match dispatch(&mut self.before_attempt, attempt) {
                Dispatch::Succeed(response) => return session.forced_success(response),
                Dispatch::Fail(reason) => return session.forced_failure(reason),
                Dispatch::Proceed { delay: Some(delay) } => {
                    if !session.suspend(&*self.sleeper, attempt, delay, &token).await {
                        return session.cancelled();
                    }
                }
                Dispatch::Proceed { delay: None } => {}
            }

            session.span.record_attempt(attempt);
            let result = tokio::select! {
                biased;
                () = token.cancelled() => return session.cancelled(),
                result = probe(attempt) => result,
            };
            session.attempts = attempt;

            match self.condition.evaluate(&result) {
                Evaluation::Success { .. } => return session.succeeded(result),
                Evaluation::Failure { acceptor } => {
                    let reason = format!(
                        "waiter entered a failure state: {}",
                        self.condition.acceptors()[acceptor]
                    );
                    return session.fail(FailureKind::Acceptor, reason, Some(result));
                }
                Evaluation::Undetermined { .. } => session.observe(result),
            }

            if self.max_attempts.is_exhausted(session.attempts) {
                return session.exhausted(self.max_attempts);
            }

            let delay = match dispatch(&mut self.before_wait, attempt) {
                Dispatch::Succeed(response) => return session.forced_success(response),
                Dispatch::Fail(reason) => return session.forced_failure(reason),
                Dispatch::Proceed { delay } => delay.unwrap_or(self.interval),
            };
            if !delay.is_zero() && !session.suspend(&*self.sleeper, attempt, delay, &token).await {
                return session.cancelled();
            }
        }
    }
}

impl std::fmt::Debug for Waiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Waiter")
            .field("condition", &self.condition.name())
            .field("interval", &self.interval)
            .field("max_attempts", &self.max_attempts)
            .field("before_attempt", &self.before_attempt.len())
            .field("before_wait", &self.before_wait.len())
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Mutable state of a running session
struct Session {
    span: WaitSpan,
    started: Instant,
    attempts: u32,
    total_wait: Duration,
    last_result: Option<ProbeResult>,
    last_success: Option<ProbeResponse>,
}

impl Session {
    fn new(span: WaitSpan) -> Self {
        Self {
            span,
            started: Instant::now(),
            attempts: 0,
            total_wait: Duration::ZERO,
            last_result: None,
            last_success: None,
        }
    }

    fn observe(&mut self, result: ProbeResult) {
        match &result {
            Ok(response) => {
                self.span.record_undetermined(self.attempts, None);
                self.last_success = Some(response.clone());
            }
            Err(error) => self.span.record_undetermined(self.attempts, Some(&error.to_string())),
        }
        self.last_result = Some(result);
    }

    /// Returns `false` when the token fired first
    async fn suspend(
        &mut self,
        sleeper: &dyn Sleeper,
        attempt: u32,
        delay: Duration,
        token: &CancellationToken,
    ) -> bool {
        self.span.record_wait(attempt, delay);
        match sleep_or_cancel(sleeper, delay, token).await {
            SleepOutcome::Elapsed => {
                self.total_wait += delay;
                true
            }
            SleepOutcome::Cancelled => false,
        }
    }

    fn succeeded(self, result: ProbeResult) -> WaitOutcome {
        self.span.record_success(self.attempts, self.total_wait, false);
        Ok(WaitSuccess {
            response: result.ok(),
            attempts: self.attempts,
            total_wait: self.total_wait,
            elapsed: self.started.elapsed(),
        })
    }

    fn forced_success(self, response: Option<ProbeResponse>) -> WaitOutcome {
        self.span.record_success(self.attempts, self.total_wait, true);
        Ok(WaitSuccess {
            response: response.or(self.last_success),
            attempts: self.attempts,
            total_wait: self.total_wait,
            elapsed: self.started.elapsed(),
        })
    }

    fn forced_failure(self, reason: String) -> WaitOutcome {
        let last_result = self.last_result.clone();
        self.fail(FailureKind::Forced, reason, last_result)
    }

    fn cancelled(self) -> WaitOutcome {
        let last_result = self.last_result.clone();
        let reason = format!("cancelled after {} attempt(s)", self.attempts);
        self.fail(FailureKind::Cancelled, reason, last_result)
    }

    fn exhausted(self, max_attempts: MaxAttempts) -> WaitOutcome {
        let reason = match &self.last_result {
            Some(Err(error)) => {
                format!("max attempts ({max_attempts}) exceeded; last error: {error}")
            }
            Some(Ok(response)) => format!(
                "max attempts ({max_attempts}) exceeded; last response status {}",
                response.status
            ),
            None => format!("max attempts ({max_attempts}) exceeded"),
        };
        let last_result = self.last_result.clone();
        self.fail(FailureKind::Exhausted, reason, last_result)
    }

    fn fail(self, kind: FailureKind, reason: String, last_result: Option<ProbeResult>) -> WaitOutcome {
        self.span.record_failure(kind, self.attempts, &reason);
        Err(WaitFailure { kind, reason, attempts: self.attempts, last_result })
    }
}
