//! Common error types and utilities shared by the Waitline crates
//!
//! [`CommonError`] covers the decoding and file I/O failures that recur
//! wherever waiters documents or config files are read. Crate-specific error
//! enums compose with it instead of duplicating these variants.
//!
//! # Error Handling Architecture
//!
//! 1. **`CommonError`**: decoding and file I/O failures.
//! 2. **`ErrorClassification` trait**: a uniform interface for deciding
//!    whether an error is worth retrying at a higher level and how loudly it
//!    should be reported.
//! 3. **`ErrorSeverity` enum**: severity levels shared by logging and
//!    alerting.
//!
//! ## Composing with module-specific errors
//!
//! ```rust,ignore
//! #[derive(Debug, Error)]
//! pub enum LoaderError {
//!     #[error("Definition file has no waiters: {0}")]
//!     Empty(String),
//!
//!     #[error(transparent)]
//!     Common(#[from] CommonError),
//! }
//!
//! impl ErrorClassification for LoaderError {
//!     fn is_retryable(&self) -> bool {
//!         match self {
//!             Self::Empty(_) => false,
//!             Self::Common(e) => e.is_retryable(),
//!         }
//!     }
//!     // ... implement other trait methods
//! }
//! ```
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected conditions | Unknown waiter name, cancelled wait |
//! | **Warning** | Degraded but operational | Deadline reached |
//! | **Error** | Failure requiring attention | Unreadable file, parse errors |
//! | **Critical** | System integrity at risk | Invalid waiter definitions |

use std::fmt;
use std::time::Duration;

/// Failures shared by every crate that reads waiters documents or config
/// files from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonError {
    /// A document could not be decoded
    Serialization { message: String, format: &'static str },

    /// A file or directory could not be read
    Persistence { message: String },
}

impl fmt::Display for CommonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serialization { message, format } => {
                write!(f, "Serialization error ({}): {}", format, message)
            }
            Self::Persistence { message } => write!(f, "Persistence error: {}", message),
        }
    }
}

impl std::error::Error for CommonError {}

impl ErrorClassification for CommonError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Error
    }

    fn is_critical(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

impl CommonError {
    /// Create a serialization error tagged with the document format
    pub fn serialization<S: Into<String>>(format: &'static str, message: S) -> Self {
        Self::Serialization { message: message.into(), format }
    }

    /// Create a persistence error
    pub fn persistence<S: Into<String>>(message: S) -> Self {
        Self::Persistence { message: message.into() }
    }
}

/// Error classification trait for consistent error handling across crates
///
/// Callers of a failed wait use this to decide whether to retry at a higher
/// level or give up.
pub trait ErrorClassification {
    /// Whether the failed operation may succeed if attempted again
    fn is_retryable(&self) -> bool;

    /// Severity used for logging and alerting
    fn severity(&self) -> ErrorSeverity;

    /// Whether the error requires immediate attention
    fn is_critical(&self) -> bool;

    /// Suggested delay before retrying, if the error carries one
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

// Standard conversions from common error types
impl From<serde_json::Error> for CommonError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("JSON", err.to_string())
    }
}

impl From<std::io::Error> for CommonError {
    fn from(err: std::io::Error) -> Self {
        Self::persistence(err.to_string())
    }
}

impl From<toml::de::Error> for CommonError {
    fn from(err: toml::de::Error) -> Self {
        Self::serialization("TOML", err.to_string())
    }
}
