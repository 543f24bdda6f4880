//! Backoff strategies with jitter
//!
//! A [`PacedBackoff`] turns a 1-indexed attempt number into the delay that
//! should elapse before the next attempt. The poll loop consults it from a
//! `before_wait` hook when the waiter's fixed interval is set to zero.

use std::time::Duration;

use rand::Rng;
use thiserror::Error;

/// Errors raised while building a backoff configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BackoffError {
    /// The exponential base must be finite and positive
    #[error("exponential base must be a finite number greater than 0, got {base}")]
    InvalidBase { base: f64 },

    /// The cap of an exponential strategy is below its initial delay
    #[error("max_delay {max_delay:?} is smaller than initial_delay {initial_delay:?}")]
    CapBelowInitial { initial_delay: Duration, max_delay: Duration },
}

/// Backoff strategy for calculating delays
#[derive(Debug, Clone)]
#[allow(unpredictable_function_pointer_comparisons)]
#[derive(PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between attempts
    Fixed(Duration),
    /// Linear backoff: initial_delay + (step * increment)
    Linear { initial_delay: Duration, increment: Duration },
    /// Exponential backoff: initial_delay * base^step, capped at max_delay
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
    /// Custom backoff function of the 0-based step
    Custom(fn(u32) -> Duration),
}

impl BackoffStrategy {
    /// Calculate the delay for a 0-based step
    pub fn calculate_delay(&self, step: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Linear { initial_delay, increment } => {
                initial_delay.saturating_add(increment.saturating_mul(step))
            }
            BackoffStrategy::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(step).unwrap_or(i32::MAX);
                let delay = initial_delay.as_millis() as f64 * base.powi(exponent);
                let delay_ms = delay.min(max_delay.as_millis() as f64) as u64;
                Duration::from_millis(delay_ms)
            }
            BackoffStrategy::Custom(f) => f(step),
        }
    }
}

/// Jitter type for adding randomness to delays
#[derive(Debug, Clone, PartialEq)]
pub enum Jitter {
    /// No jitter
    None,
    /// Full jitter: 0 to calculated_delay
    Full,
    /// Equal jitter: calculated_delay/2 to calculated_delay
    Equal,
    /// Decorrelated jitter: base to 3 * calculated_delay
    Decorrelated { base: Duration },
}

impl Jitter {
    /// Apply jitter to the calculated delay
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            Jitter::None => delay,
            Jitter::Full => Duration::from_millis(random_up_to(delay.as_millis() as u64)),
            Jitter::Equal => {
                let half = delay.as_millis() as u64 / 2;
                Duration::from_millis(half + random_up_to(half))
            }
            Jitter::Decorrelated { base } => {
                let base_ms = base.as_millis() as u64;
                let upper = (delay.as_millis() as u64).saturating_mul(3).max(base_ms);
                Duration::from_millis(base_ms + random_up_to(upper - base_ms))
            }
        }
    }
}

/// Uniform value in `0..=max`
fn random_up_to(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=max)
}

/// A validated strategy paired with its jitter
#[derive(Debug, Clone, PartialEq)]
pub struct PacedBackoff {
    strategy: BackoffStrategy,
    jitter: Jitter,
}

impl PacedBackoff {
    /// Create a configuration builder
    pub fn builder() -> BackoffStrategyBuilder {
        BackoffStrategyBuilder::new()
    }

    /// Delay to apply after the given 1-indexed attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.strategy.calculate_delay(attempt.saturating_sub(1));
        self.jitter.apply(base)
    }

    /// The underlying strategy
    pub fn strategy(&self) -> &BackoffStrategy {
        &self.strategy
    }

    /// The configured jitter
    pub fn jitter(&self) -> &Jitter {
        &self.jitter
    }
}

impl Default for PacedBackoff {
    fn default() -> Self {
        Self {
            strategy: BackoffStrategy::Exponential {
                initial_delay: Duration::from_secs(1),
                base: 2.0,
                max_delay: Duration::from_secs(120),
            },
            jitter: Jitter::None,
        }
    }
}

/// Builder for [`PacedBackoff`] with fluent API
#[derive(Debug)]
pub struct BackoffStrategyBuilder {
    backoff: PacedBackoff,
}

impl Default for BackoffStrategyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BackoffStrategyBuilder {
    pub fn new() -> Self {
        Self { backoff: PacedBackoff::default() }
    }

    pub fn fixed(mut self, delay: Duration) -> Self {
        self.backoff.strategy = BackoffStrategy::Fixed(delay);
        self
    }

    pub fn linear(mut self, initial_delay: Duration, increment: Duration) -> Self {
        self.backoff.strategy = BackoffStrategy::Linear { initial_delay, increment };
        self
    }

    pub fn exponential(mut self, initial_delay: Duration, base: f64, max_delay: Duration) -> Self {
        self.backoff.strategy = BackoffStrategy::Exponential { initial_delay, base, max_delay };
        self
    }

    pub fn custom(mut self, f: fn(u32) -> Duration) -> Self {
        self.backoff.strategy = BackoffStrategy::Custom(f);
        self
    }

    pub fn no_jitter(mut self) -> Self {
        self.backoff.jitter = Jitter::None;
        self
    }

    pub fn full_jitter(mut self) -> Self {
        self.backoff.jitter = Jitter::Full;
        self
    }

    pub fn equal_jitter(mut self) -> Self {
        self.backoff.jitter = Jitter::Equal;
        self
    }

    pub fn decorrelated_jitter(mut self, base: Duration) -> Self {
        self.backoff.jitter = Jitter::Decorrelated { base };
        self
    }

    pub fn build(self) -> Result<PacedBackoff, BackoffError> {
        if let BackoffStrategy::Exponential { initial_delay, base, max_delay } =
            &self.backoff.strategy
        {
            if !(*base > 0.0 && base.is_finite()) {
                return Err(BackoffError::InvalidBase { base: *base });
            }
            if max_delay < initial_delay {
                return Err(BackoffError::CapBelowInitial {
                    initial_delay: *initial_delay,
                    max_delay: *max_delay,
                });
            }
        }
        Ok(self.backoff)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for backoff strategies and jitter

    use super::*;

    #[test]
    fn test_backoff_strategy_fixed() {
        let strategy = BackoffStrategy::Fixed(Duration::from_millis(100));

        assert_eq!(strategy.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(strategy.calculate_delay(100), Duration::from_millis(100));
    }

    #[test]
    fn test_backoff_strategy_linear() {
        let strategy = BackoffStrategy::Linear {
            initial_delay: Duration::from_millis(100),
            increment: Duration::from_millis(50),
        };

        assert_eq!(strategy.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(strategy.calculate_delay(2), Duration::from_millis(200));
        assert_eq!(strategy.calculate_delay(10), Duration::from_millis(600));
    }

    /// Exponential delays double per step and stop at the cap.
    #[test]
    fn test_backoff_strategy_exponential() {
        let strategy = BackoffStrategy::Exponential {
            initial_delay: Duration::from_millis(100),
            base: 2.0,
            max_delay: Duration::from_secs(10),
        };

        assert_eq!(strategy.calculate_delay(0), Duration::from_millis(100));
        assert_eq!(strategy.calculate_delay(1), Duration::from_millis(200));
        assert_eq!(strategy.calculate_delay(3), Duration::from_millis(800));
        assert_eq!(strategy.calculate_delay(40), Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_strategy_custom() {
        let strategy = BackoffStrategy::Custom(|step| Duration::from_secs(u64::from(step).pow(2)));

        assert_eq!(strategy.calculate_delay(0), Duration::ZERO);
        assert_eq!(strategy.calculate_delay(3), Duration::from_secs(9));
    }

    #[test]
    fn test_jitter_none() {
        let delay = Duration::from_millis(100);
        assert_eq!(Jitter::None.apply(delay), delay);
    }

    #[test]
    fn test_jitter_full_within_bounds() {
        let delay = Duration::from_millis(100);
        for _ in 0..50 {
            assert!(Jitter::Full.apply(delay) <= delay);
        }
    }

    #[test]
    fn test_jitter_equal_within_bounds() {
        let delay = Duration::from_millis(100);
        for _ in 0..50 {
            let jittered = Jitter::Equal.apply(delay);
            assert!(jittered >= Duration::from_millis(50));
            assert!(jittered <= delay);
        }
    }

    #[test]
    fn test_jitter_decorrelated_lower_bound() {
        let jitter = Jitter::Decorrelated { base: Duration::from_millis(10) };
        let jittered = jitter.apply(Duration::from_millis(100));
        assert!(jittered >= Duration::from_millis(10));
        assert!(jittered <= Duration::from_millis(300));
    }

    #[test]
    fn test_jitter_zero_delay() {
        assert_eq!(Jitter::Full.apply(Duration::ZERO), Duration::ZERO);
        assert_eq!(Jitter::Equal.apply(Duration::ZERO), Duration::ZERO);
    }

    /// Attempt numbers are 1-indexed; the first attempt uses step 0.
    #[test]
    fn test_paced_backoff_attempt_mapping() {
        let backoff = PacedBackoff::builder()
            .exponential(Duration::from_secs(1), 2.0, Duration::from_secs(8))
            .no_jitter()
            .build()
            .expect("valid backoff");

        assert_eq!(backoff.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(backoff.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(backoff.delay_for_attempt(4), Duration::from_secs(8));
        assert_eq!(backoff.delay_for_attempt(5), Duration::from_secs(8));
        assert_eq!(backoff.delay_for_attempt(0), Duration::from_secs(1));
    }

    #[test]
    fn test_builder_rejects_invalid_base() {
        let result = PacedBackoff::builder()
            .exponential(Duration::from_secs(1), 0.0, Duration::from_secs(10))
            .build();
        assert_eq!(result, Err(BackoffError::InvalidBase { base: 0.0 }));
    }

    #[test]
    fn test_builder_rejects_non_finite_base() {
        for base in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = PacedBackoff::builder()
                .exponential(Duration::from_secs(1), base, Duration::from_secs(10))
                .build();
            assert!(
                matches!(result, Err(BackoffError::InvalidBase { base: b }) if b.is_nan() || b.is_infinite()),
                "base {base} should be rejected"
            );
        }
    }

    #[test]
    fn test_builder_rejects_cap_below_initial() {
        let result = PacedBackoff::builder()
            .exponential(Duration::from_secs(10), 2.0, Duration::from_secs(1))
            .build();
        assert!(matches!(result, Err(BackoffError::CapBelowInitial { .. })));
    }

    #[test]
    fn test_builder_jitter_types() {
        let backoff = PacedBackoff::builder().full_jitter().build().expect("valid");
        assert_eq!(backoff.jitter(), &Jitter::Full);

        let backoff = PacedBackoff::builder().equal_jitter().build().expect("valid");
        assert_eq!(backoff.jitter(), &Jitter::Equal);

        let backoff = PacedBackoff::builder()
            .decorrelated_jitter(Duration::from_millis(10))
            .build()
            .expect("valid");
        assert_eq!(backoff.jitter(), &Jitter::Decorrelated { base: Duration::from_millis(10) });
    }

    #[test]
    fn test_builder_fixed_and_linear() {
        let backoff =
            PacedBackoff::builder().fixed(Duration::from_secs(5)).build().expect("valid");
        assert_eq!(backoff.strategy(), &BackoffStrategy::Fixed(Duration::from_secs(5)));

        let backoff = PacedBackoff::builder()
            .linear(Duration::from_secs(1), Duration::from_secs(1))
            .build()
            .expect("valid");
        assert_eq!(backoff.delay_for_attempt(3), Duration::from_secs(3));
    }
}
