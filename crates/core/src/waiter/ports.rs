//! Port interfaces for waiters
//!
//! The probe operation is the only thing the poll loop needs from the
//! outside world. Infrastructure crates implement it over a real service
//! client.

use async_trait::async_trait;
use serde_json::Value;
use waitline_domain::ProbeResult;

/// Performs one request against a service and reports the result
#[async_trait]
pub trait ProbeClient: Send + Sync {
    /// Invoke `operation` with `params`
    ///
    /// Service errors are returned as `Err(ProbeError)`; they are data for
    /// the acceptors, not failures of the waiter.
    async fn call(&self, operation: &str, params: &Value) -> ProbeResult;
}
