//! # Waitline Infrastructure
//!
//! File, environment and subscriber code around the waiter engine.
//!
//! This crate contains:
//! - Configuration loading (environment, JSON and TOML files)
//! - Waiters document loading into a `WaiterRegistry`
//! - Tracing subscriber initialisation
//!
//! ## Architecture
//! - Depends on `waitline-common`, `waitline-domain` and `waitline-core`
//! - Contains all "impure" code (I/O, global subscriber)

pub mod config;
pub mod definitions;
pub mod observability;

// Re-export commonly used items
pub use definitions::{load_document, load_registry, registry_from_config, LoadError};
pub use observability::init_tracing;
