//! Domain types and models

pub mod acceptor;
pub mod outcome;
pub mod probe;
pub mod waiter;

pub use acceptor::{AcceptorDefinition, AcceptorState, MatcherKind};
pub use outcome::{FailureKind, WaitFailure, WaitOutcome, WaitSuccess};
pub use probe::{ProbeError, ProbeResponse, ProbeResult};
pub use waiter::{normalize_waiter_name, MaxAttempts, WaiterDefinition, WaitersDocument};
