//! Results of a single probe operation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A successful probe response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResponse {
    /// HTTP status code of the response
    pub status: u16,
    /// Decoded response body
    pub body: Value,
}

impl ProbeResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// A `200 OK` response with the given body
    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }
}

/// A failed probe
///
/// Probe errors are data to the poll loop: they are matched by `error` and
/// `status` acceptors and otherwise treated as an undetermined attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ProbeError {
    /// Service error code, e.g. `NotFound`
    pub code: String,
    pub message: String,
    /// HTTP status, when the error came from a response
    pub status: Option<u16>,
}

impl ProbeError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code: code.into(), message: message.into(), status: None }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Outcome of one probe invocation
pub type ProbeResult = Result<ProbeResponse, ProbeError>;
