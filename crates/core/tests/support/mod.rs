//! Shared test helpers for `waitline-core` integration tests.
//!
//! A scripted probe client replays canned results so tests can focus on
//! poll loop behaviour instead of transport boilerplate.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use waitline_core::{ProbeClient, WaiterRegistry};
use waitline_domain::{ProbeError, ProbeResponse, ProbeResult, WaitersDocument};

/// Probe client that replays a script of results
///
/// Once the script runs out, the last result repeats.
#[derive(Clone, Default)]
pub struct ScriptedClient {
    script: Arc<Mutex<VecDeque<ProbeResult>>>,
    last: Arc<Mutex<Option<ProbeResult>>>,
    calls: Arc<AtomicU32>,
    operations: Arc<Mutex<Vec<(String, Value)>>>,
    latency: Option<Duration>,
}

impl ScriptedClient {
    pub fn new(results: impl IntoIterator<Item = ProbeResult>) -> Self {
        Self { script: Arc::new(Mutex::new(results.into_iter().collect())), ..Self::default() }
    }

    /// Responses whose body is `{"Status": <status>}`
    pub fn statuses(statuses: &[&str]) -> Self {
        Self::new(statuses.iter().map(|status| status_response(status)))
    }

    /// Delay every call by `latency` using tokio time
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Operation and parameters of every call, in order
    pub fn operations(&self) -> Vec<(String, Value)> {
        self.operations.lock().clone()
    }

    fn next_result(&self) -> ProbeResult {
        let next = self.script.lock().pop_front();
        let mut last = self.last.lock();
        match next {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(ProbeError::new("ScriptExhausted", "no scripted results"))),
        }
    }
}

#[async_trait]
impl ProbeClient for ScriptedClient {
    async fn call(&self, operation: &str, params: &Value) -> ProbeResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.operations.lock().push((operation.to_string(), params.clone()));
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.next_result()
    }
}

pub fn status_response(status: &str) -> ProbeResult {
    Ok(ProbeResponse::ok(json!({ "Status": status })))
}

/// Registry with the `ResourceReady` waiter used across scenarios
///
/// `READY` succeeds, `FAILED` fails, `NotFound` errors retry.
pub fn resource_registry(delay_secs: u64, max_attempts: u32) -> WaiterRegistry {
    let document = json!({
        "version": 2,
        "waiters": {
            "ResourceReady": {
                "operation": "DescribeResource",
                "delay": delay_secs,
                "maxAttempts": max_attempts,
                "acceptors": [
                    {"matcher": "path", "argument": "Status", "expected": "READY", "state": "success"},
                    {"matcher": "path", "argument": "Status", "expected": "FAILED", "state": "failure"},
                    {"matcher": "error", "expected": "NotFound", "state": "retry"}
                ]
            },
            "ResourceDeleted": {
                "operation": "DescribeResource",
                "delay": delay_secs,
                "maxAttempts": max_attempts,
                "acceptors": [
                    {"matcher": "error", "expected": "NotFound", "state": "success"},
                    {"matcher": "status", "expected": 403, "state": "failure"}
                ]
            }
        }
    });
    let document: WaitersDocument =
        serde_json::from_value(document).expect("fixture document should deserialize");
    WaiterRegistry::from_document(&document).expect("fixture document should compile")
}

/// Registry with an ECS-style `ServicesStable` waiter built on a filter
/// expression
pub fn services_registry(max_attempts: u32) -> WaiterRegistry {
    let document = json!({
        "version": 2,
        "waiters": {
            "ServicesStable": {
                "operation": "DescribeServices",
                "delay": 0,
                "maxAttempts": max_attempts,
                "acceptors": [
                    {
                        "matcher": "pathAny",
                        "argument": "failures[].reason",
                        "expected": "MISSING",
                        "state": "failure"
                    },
                    {
                        "matcher": "pathAny",
                        "argument": "services[].status",
                        "expected": "DRAINING",
                        "state": "failure"
                    },
                    {
                        "matcher": "path",
                        "argument": "length(services[?!(length(deployments) == `1` && runningCount == desiredCount)]) == `0`",
                        "expected": true,
                        "state": "success"
                    }
                ]
            }
        }
    });
    let document: WaitersDocument =
        serde_json::from_value(document).expect("fixture document should deserialize");
    WaiterRegistry::from_document(&document).expect("fixture document should compile")
}

/// `DescribeServices` body with one service per `(deployments, running)` pair
/// and a desired count of 2
pub fn services_response(services: &[(usize, u32)]) -> ProbeResult {
    let services: Vec<Value> = services
        .iter()
        .map(|&(deployments, running)| {
            json!({
                "status": "ACTIVE",
                "deployments": vec![json!({"status": "PRIMARY"}); deployments],
                "runningCount": running,
                "desiredCount": 2
            })
        })
        .collect();
    Ok(ProbeResponse::ok(json!({ "services": services, "failures": [] })))
}
