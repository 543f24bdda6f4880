//! Client facade over the registry and the poll loop

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use waitline_common::time::Sleeper;
use waitline_domain::{MaxAttempts, PollingConfig, WaitSuccess};

use super::poller::Waiter;
use super::ports::ProbeClient;
use super::registry::WaiterRegistry;
use crate::error::WaiterError;

/// Runs named waiters against a probe client
///
/// Cheap to clone; clones share the registry and the probe client, so many
/// sessions can run concurrently.
#[derive(Clone)]
pub struct WaiterClient {
    registry: WaiterRegistry,
    probe: Arc<dyn ProbeClient>,
    polling: PollingConfig,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl WaiterClient {
    pub fn new(registry: WaiterRegistry, probe: Arc<dyn ProbeClient>) -> Self {
        Self { registry, probe, polling: PollingConfig::default(), sleeper: None }
    }

    /// Overrides applied to every session before the caller's `configure`
    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    /// Sleeper used by every session
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    pub fn registry(&self) -> &WaiterRegistry {
        &self.registry
    }

    /// Registered waiter names, sorted
    pub fn waiter_names(&self) -> Vec<String> {
        self.registry.waiter_names()
    }

    /// Poll `name` with `params` until it succeeds or fails
    ///
    /// `configure` receives the session after configuration overrides have
    /// been applied and may change the interval or attempt budget, install
    /// hooks or attach a cancellation token.
    ///
    /// # Errors
    /// - `WaiterError::NoSuchWaiter` if `name` is not registered; no probe is
    ///   made
    /// - `WaiterError::WaiterFailed` for acceptor failure, exhaustion, forced
    ///   failure or cancellation
    pub async fn wait_until<F>(
        &self,
        name: &str,
        params: Value,
        configure: F,
    ) -> Result<WaitSuccess, WaiterError>
    where
        F: FnOnce(&mut Waiter),
    {
        let condition = self.registry.lookup(name)?;
        let waiter_name = condition.name().to_string();
        let operation = condition.operation().to_string();

        let mut waiter = Waiter::new(condition);
        if let Some(interval) = self.polling.interval_override() {
            waiter.set_interval(interval);
        }
        if let Some(max_attempts) = self.polling.max_attempts_override {
            waiter.set_max_attempts(MaxAttempts::Limited(max_attempts));
        }
        if let Some(sleeper) = &self.sleeper {
            waiter.with_sleeper(Arc::clone(sleeper));
        }
        configure(&mut waiter);

        debug!(waiter = %waiter_name, operation = %operation, "Waiting");
        let probe = &*self.probe;
        let (operation, params) = (operation.as_str(), &params);
        waiter
            .run(|_attempt| probe.call(operation, params))
            .await
            .map_err(|failure| WaiterError::WaiterFailed { waiter: waiter_name, failure })
    }

    /// [`WaiterClient::wait_until`] with the waiter's defaults
    ///
    /// # Errors
    /// See [`WaiterClient::wait_until`].
    pub async fn wait_for(&self, name: &str, params: Value) -> Result<WaitSuccess, WaiterError> {
        self.wait_until(name, params, |_| {}).await
    }
}

impl std::fmt::Debug for WaiterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaiterClient")
            .field("waiters", &self.registry.len())
            .field("polling", &self.polling)
            .finish_non_exhaustive()
    }
}
