//! Domain constants
//!
//! Defaults applied when a waiters document or configuration omits a value.

/// Waiters document version understood by the loader
pub const WAITERS_DOCUMENT_VERSION: u32 = 2;

/// Delay between attempts when a definition does not specify one (seconds)
pub const DEFAULT_DELAY_SECS: u64 = 5;

/// Attempt budget when a definition does not specify one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Default tracing filter directive
pub const DEFAULT_LOG_LEVEL: &str = "info";

// File naming used by the infra loaders
pub const CONFIG_FILE_STEM: &str = "waitline";
pub const DEFINITIONS_FILE_SUFFIX: &str = ".waiters";
