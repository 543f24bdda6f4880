//! Waiter definitions and waiters documents
//!
//! A waiters document maps PascalCase waiter names to definitions:
//!
//! ```json
//! {
//!   "version": 2,
//!   "waiters": {
//!     "BucketExists": {
//!       "operation": "HeadBucket",
//!       "delay": 5,
//!       "maxAttempts": 20,
//!       "acceptors": [
//!         { "matcher": "status", "expected": 200, "state": "success" },
//!         { "matcher": "error", "expected": "NotFound", "state": "retry" }
//!       ]
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

use super::acceptor::AcceptorDefinition;
use crate::constants::{DEFAULT_DELAY_SECS, DEFAULT_MAX_ATTEMPTS, WAITERS_DOCUMENT_VERSION};
use crate::errors::DefinitionError;

/// Attempt budget of a poll session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaxAttempts {
    /// At most this many probes
    Limited(u32),
    /// Poll until an acceptor, a hook or cancellation ends the session
    Unlimited,
}

impl MaxAttempts {
    /// True once `attempts` probes have used up the budget
    pub fn is_exhausted(self, attempts: u32) -> bool {
        match self {
            Self::Limited(max) => attempts >= max,
            Self::Unlimited => false,
        }
    }

    pub fn limit(self) -> Option<u32> {
        match self {
            Self::Limited(max) => Some(max),
            Self::Unlimited => None,
        }
    }
}

impl fmt::Display for MaxAttempts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(max) => write!(f, "{max}"),
            Self::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// One waiter as written in a waiters document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaiterDefinition {
    /// Operation probed on every attempt
    pub operation: String,
    /// Seconds between attempts
    #[serde(default = "default_delay")]
    pub delay: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    pub acceptors: Vec<AcceptorDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_delay() -> u64 {
    DEFAULT_DELAY_SECS
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

impl WaiterDefinition {
    pub fn delay_duration(&self) -> Duration {
        Duration::from_secs(self.delay)
    }

    pub fn max_attempts_limit(&self) -> MaxAttempts {
        MaxAttempts::Limited(self.max_attempts)
    }

    /// Structural validation of the definition and each acceptor
    ///
    /// # Errors
    /// Returns the first `DefinitionError` found, in acceptor order.
    pub fn validate(&self, name: &str) -> Result<(), DefinitionError> {
        if self.operation.trim().is_empty() {
            return Err(DefinitionError::MissingOperation { waiter: name.to_string() });
        }
        if self.acceptors.is_empty() {
            return Err(DefinitionError::NoAcceptors { waiter: name.to_string() });
        }
        if self.max_attempts == 0 {
            return Err(DefinitionError::ZeroMaxAttempts { waiter: name.to_string() });
        }
        self.acceptors
            .iter()
            .enumerate()
            .try_for_each(|(index, acceptor)| acceptor.validate(name, index))
    }
}

/// A complete waiters document for one service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitersDocument {
    pub version: u32,
    pub waiters: BTreeMap<String, WaiterDefinition>,
}

impl WaitersDocument {
    /// Parse and validate a JSON document
    ///
    /// # Errors
    /// Returns `DefinitionError::Parse` for malformed JSON and any
    /// validation error from [`WaitersDocument::validate`].
    pub fn from_json(contents: &str) -> Result<Self, DefinitionError> {
        let document: Self = serde_json::from_str(contents)?;
        document.validate()?;
        Ok(document)
    }

    /// Check the version and every waiter
    ///
    /// # Errors
    /// Returns `UnsupportedVersion` for documents other than version 2, or
    /// the first invalid waiter's error.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.version != WAITERS_DOCUMENT_VERSION {
            return Err(DefinitionError::UnsupportedVersion {
                found: self.version,
                expected: WAITERS_DOCUMENT_VERSION,
            });
        }
        for (name, definition) in &self.waiters {
            normalize_waiter_name(name)?;
            definition.validate(name)?;
        }
        Ok(())
    }
}

/// Normalise a waiter name to its `snake_case` registry key
///
/// `BucketExists`, `bucketExists` and `bucket_exists` all map to
/// `bucket_exists`.
///
/// # Errors
/// Returns `DefinitionError::InvalidName` when the name has no alphanumeric
/// characters.
pub fn normalize_waiter_name(name: &str) -> Result<String, DefinitionError> {
    let trimmed = name.trim();
    if !trimmed.chars().any(char::is_alphanumeric) {
        return Err(DefinitionError::InvalidName(name.to_string()));
    }
    Ok(trimmed.to_case(Case::Snake))
}
