//! Configuration structures
//!
//! Loaded by `waitline-infra` from the environment or a JSON/TOML file.
//! Every section has defaults, so a partial file is valid.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LOG_LEVEL;
use crate::errors::{Result, WaitlineError};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitlineConfig {
    pub definitions: DefinitionsConfig,
    pub polling: PollingConfig,
    pub logging: LoggingConfig,
}

/// Where waiters documents are read from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionsConfig {
    /// A single document or a directory of documents
    pub path: Option<PathBuf>,
}

/// Overrides applied to every waiter before caller configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_override_ms: Option<u64>,
    pub max_attempts_override: Option<u32>,
}

impl PollingConfig {
    /// Interval override as a `Duration`
    pub fn interval_override(&self) -> Option<Duration> {
        self.interval_override_ms.map(Duration::from_millis)
    }

    /// True when neither override is set
    pub fn is_empty(&self) -> bool {
        self.interval_override_ms.is_none() && self.max_attempts_override.is_none()
    }

    /// Reject overrides no waiter could run with
    ///
    /// # Errors
    /// `WaitlineError::Config` when the attempt override is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts_override == Some(0) {
            return Err(WaitlineError::Config(
                "Invalid max attempts: override must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `waitline_core=debug`
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), json: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: WaitlineConfig =
            serde_json::from_str(r#"{"polling": {"max_attempts_override": 3}}"#).unwrap();

        assert_eq!(config.polling.max_attempts_override, Some(3));
        assert_eq!(config.polling.interval_override(), None);
        assert_eq!(config.logging.level, "info");
        assert!(config.definitions.path.is_none());
    }

    #[test]
    fn test_polling_config_is_empty() {
        assert!(PollingConfig::default().is_empty());
        let polling = PollingConfig { interval_override_ms: Some(0), max_attempts_override: None };
        assert!(!polling.is_empty());
        assert_eq!(polling.interval_override(), Some(Duration::ZERO));
    }

    /// A zero interval is allowed, a zero attempt budget is not.
    #[test]
    fn test_polling_config_validate() {
        let polling = PollingConfig { interval_override_ms: Some(0), max_attempts_override: Some(1) };
        assert!(polling.validate().is_ok());

        let zero = PollingConfig { interval_override_ms: None, max_attempts_override: Some(0) };
        let err = zero.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid max attempts: override must be at least 1"
        );
    }
}
