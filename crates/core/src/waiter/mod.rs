//! Waiters: conditions, registry and the poll loop

pub mod acceptor;
pub mod client;
pub mod condition;
pub mod hooks;
pub mod path;
pub mod poller;
pub mod ports;
pub mod registry;
pub mod tracing;
