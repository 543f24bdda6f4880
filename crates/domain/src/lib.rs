//! # Waitline Domain
//!
//! Data types shared by every Waitline crate.
//!
//! This crate contains:
//! - Probe results (`ProbeResponse`, `ProbeError`)
//! - Waiter and acceptor definitions as they appear in waiters documents
//! - Wait outcomes and failure kinds
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other Waitline crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
