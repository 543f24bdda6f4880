//! Suspension between poll attempts
//!
//! The poll loop never calls `tokio::time::sleep` directly. It suspends
//! through a [`Sleeper`] so that tests can intercept the wait, and it always
//! races the wait against a [`CancellationToken`] via [`sleep_or_cancel`] so a
//! cancelled session never leaves a pending timer behind.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::clock::MockClock;

/// Suspends the calling task for a duration
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend for `duration`. Implementations must yield to the scheduler
    /// rather than block the thread.
    async fn sleep(&self, duration: Duration);
}

#[async_trait]
impl<T: Sleeper + ?Sized> Sleeper for Arc<T> {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}

/// Production sleeper backed by `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Test sleeper that records every requested duration and returns at once
///
/// When built with [`RecordingSleeper::with_clock`], each recorded sleep also
/// advances the mock clock, so deadline checks see simulated time pass.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
    clock: Option<MockClock>,
}

impl RecordingSleeper {
    /// Create a recording sleeper with no attached clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a recording sleeper that advances `clock` on every sleep
    pub fn with_clock(clock: MockClock) -> Self {
        Self { sleeps: Arc::default(), clock: Some(clock) }
    }

    /// Durations requested so far, in order
    pub fn recorded(&self) -> Vec<Duration> {
        self.sleeps.lock().clone()
    }

    /// Number of sleeps requested so far
    pub fn count(&self) -> usize {
        self.sleeps.lock().len()
    }

    /// Sum of all requested durations
    pub fn total(&self) -> Duration {
        self.sleeps.lock().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().push(duration);
        if let Some(clock) = &self.clock {
            clock.advance(duration);
        }
        tokio::task::yield_now().await;
    }
}

/// How a cancellable sleep ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    /// The full duration elapsed
    Elapsed,
    /// The token fired first; the timer was dropped
    Cancelled,
}

/// Sleep for `duration` unless `token` is cancelled first
///
/// A token that is already cancelled short-circuits without touching the
/// sleeper.
pub async fn sleep_or_cancel<S>(
    sleeper: &S,
    duration: Duration,
    token: &CancellationToken,
) -> SleepOutcome
where
    S: Sleeper + ?Sized,
{
    if token.is_cancelled() {
        return SleepOutcome::Cancelled;
    }

    tokio::select! {
        biased;
        () = token.cancelled() => {
            trace!(delay_ms = duration.as_millis() as u64, "Sleep interrupted by cancellation");
            SleepOutcome::Cancelled
        }
        () = sleeper.sleep(duration) => SleepOutcome::Elapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_sleeper_records_in_order() {
        let sleeper = RecordingSleeper::new();
        sleeper.sleep(Duration::from_millis(10)).await;
        sleeper.sleep(Duration::from_millis(30)).await;

        assert_eq!(sleeper.recorded(), vec![Duration::from_millis(10), Duration::from_millis(30)]);
        assert_eq!(sleeper.count(), 2);
        assert_eq!(sleeper.total(), Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_recording_sleeper_advances_clock() {
        let clock = MockClock::new();
        let sleeper = RecordingSleeper::with_clock(clock.clone());

        sleeper.sleep(Duration::from_secs(15)).await;
        assert_eq!(clock.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn test_sleep_or_cancel_elapsed() {
        let sleeper = RecordingSleeper::new();
        let token = CancellationToken::new();

        let outcome = sleep_or_cancel(&sleeper, Duration::from_secs(1), &token).await;
        assert_eq!(outcome, SleepOutcome::Elapsed);
        assert_eq!(sleeper.count(), 1);
    }

    /// An already-cancelled token never reaches the sleeper.
    #[tokio::test]
    async fn test_sleep_or_cancel_pre_cancelled() {
        let sleeper = RecordingSleeper::new();
        let token = CancellationToken::new();
        token.cancel();

        let outcome = sleep_or_cancel(&sleeper, Duration::from_secs(1), &token).await;
        assert_eq!(outcome, SleepOutcome::Cancelled);
        assert_eq!(sleeper.count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_or_cancel_interrupts_real_timer() {
        let token = CancellationToken::new();
        let canceller = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let started = tokio::time::Instant::now();
        let outcome = sleep_or_cancel(&TokioSleeper, Duration::from_secs(3600), &token).await;

        assert_eq!(outcome, SleepOutcome::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(3600));
    }
}
