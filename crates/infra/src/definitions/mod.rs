//! Waiters document loading
//!
//! Reads waiters documents from disk and compiles them into a
//! `WaiterRegistry`.

pub mod loader;

pub use loader::{load_document, load_registry, registry_from_config, LoadError};
