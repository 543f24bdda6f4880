//! Resilience patterns for pacing repeated operations
//!
//! - **[`backoff`]**: delay strategies (fixed, linear, exponential, custom)
//!   and jitter, used to pace poll attempts when the fixed waiter interval is
//!   disabled

pub mod backoff;

pub use backoff::{BackoffError, BackoffStrategy, BackoffStrategyBuilder, Jitter, PacedBackoff};
