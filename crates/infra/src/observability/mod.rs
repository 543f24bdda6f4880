//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the configured level.

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use waitline_domain::LoggingConfig;

static INSTALLED: OnceCell<()> = OnceCell::new();

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("invalid log filter '{directive}': {message}")]
    InvalidFilter { directive: String, message: String },

    /// Another crate installed a global subscriber first
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,
}

/// Build the filter used by [`init_tracing`]
///
/// # Errors
/// `ObservabilityError::InvalidFilter` if `RUST_LOG` is unset and `level`
/// is not a valid directive.
pub fn build_filter(level: &str) -> Result<EnvFilter, ObservabilityError> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(level).map_err(|e| ObservabilityError::InvalidFilter {
            directive: level.to_string(),
            message: e.to_string(),
        })
    })
}

/// Install the global tracing subscriber
///
/// Calling this more than once is a no-op after the first success.
///
/// # Errors
/// - `ObservabilityError::InvalidFilter` for a bad level directive
/// - `ObservabilityError::AlreadyInstalled` if a different subscriber owns
///   the global slot
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ObservabilityError> {
    INSTALLED
        .get_or_try_init(|| {
            let filter = build_filter(&config.level)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(config.json.then(|| fmt::layer().json()))
                .with((!config.json).then(|| fmt::layer()))
                .try_init()
                .map_err(|_| ObservabilityError::AlreadyInstalled)
        })
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_accepts_directives() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(build_filter("info").is_ok());
        assert!(build_filter("waitline_core=debug,warn").is_ok());
    }

    #[test]
    fn test_build_filter_rejects_garbage() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = build_filter("waitline_core=loud").unwrap_err();
        assert!(err.to_string().starts_with("invalid log filter 'waitline_core=loud'"));
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        let config = LoggingConfig { level: "warn".to_string(), json: true };
        init_tracing(&config).expect("first install");
        init_tracing(&config).expect("second call is a no-op");
    }
}
