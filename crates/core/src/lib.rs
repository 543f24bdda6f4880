//! # Waitline Core
//!
//! Condition-polling engine - no infrastructure dependencies.
//!
//! This crate contains:
//! - Path expressions evaluated against probe response bodies
//! - Acceptors and compiled conditions
//! - The waiter registry
//! - The poll loop with its hooks, cancellation and tracing
//! - The `ProbeClient` port and the `WaiterClient` facade
//!
//! ## Architecture Principles
//! - Only depends on `waitline-common` and `waitline-domain`
//! - No file, HTTP or subscriber code
//! - The probe operation is consumed through a trait or a closure
//! - Suspension goes through an injectable `Sleeper`

pub mod error;
pub mod waiter;

pub use error::WaiterError;
pub use waiter::acceptor::{Acceptor, Evaluation, Matcher};
pub use waiter::client::WaiterClient;
pub use waiter::condition::{Condition, ConditionBuilder};
pub use waiter::hooks::{backoff, deadline, HookAction};
pub use waiter::path::{PathError, PathExpr};
pub use waiter::poller::Waiter;
pub use waiter::ports::ProbeClient;
pub use waiter::registry::{WaiterRegistry, WaiterRegistryBuilder};
