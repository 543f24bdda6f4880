//! Modular common utilities shared across Waitline crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error types and classification
//! - `runtime`: async infrastructure (time, resilience)
//! - `observability`: optional tracing (implied by `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;
#[cfg(feature = "runtime")]
pub mod time;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{CommonError, ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use resilience::{BackoffError, BackoffStrategy, BackoffStrategyBuilder, Jitter, PacedBackoff};
#[cfg(feature = "runtime")]
pub use time::{
    sleep_or_cancel, Clock, MockClock, RecordingSleeper, SleepOutcome, Sleeper, SystemClock,
    TokioSleeper,
};
