//! Clock abstraction for testability
//!
//! Provides a trait-based approach to time so that deadline logic can be
//! exercised deterministically without waiting for real time to pass.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Trait for time operations to enable testing
pub trait Clock: Send + Sync {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;
}

/// Real system clock implementation for production use
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Implement Clock for Arc<T> where T: Clock for convenient sharing
impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Mock clock for deterministic testing
///
/// Clones share the same elapsed time, so a clone handed to a deadline hook
/// observes every `advance` made through the original.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use waitline_common::time::{Clock, MockClock};
///
/// let clock = MockClock::new();
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(clock.elapsed(), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a new mock clock starting at the current instant
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Set the mock clock to a specific elapsed time
    pub fn set_elapsed(&self, duration: Duration) {
        *self.elapsed.lock() = duration;
    }

    /// Get the current elapsed time
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }
}
