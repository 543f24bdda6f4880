//! Time abstractions for the poll loop
//!
//! - **[`clock`]**: real and mock monotonic clocks, used by wall-clock
//!   deadline checks
//! - **[`sleeper`]**: the suspension step between poll attempts, either a
//!   real tokio timer or a recording stand-in for tests
//!
//! ## Usage
//!
//! ```rust
//! use std::time::Duration;
//!
//! use waitline_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_secs(5));
//! assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
//! ```

pub mod clock;
pub mod sleeper;

pub use clock::{Clock, MockClock, SystemClock};
pub use sleeper::{sleep_or_cancel, RecordingSleeper, SleepOutcome, Sleeper, TokioSleeper};
