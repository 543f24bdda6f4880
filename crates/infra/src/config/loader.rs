//! Configuration loader
//!
//! Loads Waitline configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `WAITLINE_DEFINITIONS_PATH`: Waiters document or directory (required)
//! - `WAITLINE_INTERVAL_MS`: Interval override in milliseconds
//! - `WAITLINE_MAX_ATTEMPTS`: Attempt budget override
//! - `WAITLINE_LOG_LEVEL`: Tracing filter directive (default `info`)
//! - `WAITLINE_LOG_JSON`: Emit JSON logs (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./waitline.toml` or `./waitline.json` (current working directory)
//! 2. `./config.toml` or `./config.json` (current working directory)
//! 3. The same names in the parent and grandparent directories
//! 4. Relative to executable location

use std::path::{Path, PathBuf};

use waitline_domain::constants::{CONFIG_FILE_STEM, DEFAULT_LOG_LEVEL};
use waitline_domain::{
    DefinitionsConfig, LoggingConfig, PollingConfig, Result, WaitlineConfig, WaitlineError,
};

const ENV_DEFINITIONS_PATH: &str = "WAITLINE_DEFINITIONS_PATH";
const ENV_INTERVAL_MS: &str = "WAITLINE_INTERVAL_MS";
const ENV_MAX_ATTEMPTS: &str = "WAITLINE_MAX_ATTEMPTS";
const ENV_LOG_LEVEL: &str = "WAITLINE_LOG_LEVEL";
const ENV_LOG_JSON: &str = "WAITLINE_LOG_JSON";

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variable is missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `WaitlineError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
pub fn load() -> Result<WaitlineConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Like [`load`], but falls back to defaults when no source exists
///
/// Invalid values still fail.
///
/// # Errors
/// Returns `WaitlineError::Config` for malformed environment values or an
/// invalid config file.
pub fn load_or_default() -> Result<WaitlineConfig> {
    if std::env::var_os(ENV_DEFINITIONS_PATH).is_some() {
        return load_from_env();
    }
    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)),
        None => {
            tracing::debug!("No configuration source found, using defaults");
            Ok(WaitlineConfig::default())
        }
    }
}

/// Load configuration from environment variables
///
/// # Environment Variables
/// See module documentation for the complete list.
///
/// # Errors
/// Returns `WaitlineError::Config` if `WAITLINE_DEFINITIONS_PATH` is missing
/// or a numeric variable has an invalid value.
pub fn load_from_env() -> Result<WaitlineConfig> {
    load_from_vars(|key| std::env::var(key).ok())
}

/// Build configuration from an arbitrary variable source
///
/// `lookup` returns the value of a variable, or `None` when unset.
///
/// # Errors
/// Same as [`load_from_env`].
pub fn load_from_vars<F>(lookup: F) -> Result<WaitlineConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let definitions_path = lookup(ENV_DEFINITIONS_PATH).ok_or_else(|| {
        WaitlineError::Config(format!(
            "Missing required environment variable: {ENV_DEFINITIONS_PATH}"
        ))
    })?;

    let interval_override_ms = lookup(ENV_INTERVAL_MS)
        .map(|s| {
            s.trim()
                .parse::<u64>()
                .map_err(|e| WaitlineError::Config(format!("Invalid interval: {}", e)))
        })
        .transpose()?;
    let max_attempts_override = lookup(ENV_MAX_ATTEMPTS)
        .map(|s| {
            s.trim()
                .parse::<u32>()
                .map_err(|e| WaitlineError::Config(format!("Invalid max attempts: {}", e)))
        })
        .transpose()?;

    let level = lookup(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let json = lookup(ENV_LOG_JSON).map_or(false, |s| parse_bool(&s));

    let polling = PollingConfig { interval_override_ms, max_attempts_override };
    polling.validate()?;

    Ok(WaitlineConfig {
        definitions: DefinitionsConfig { path: Some(PathBuf::from(definitions_path)) },
        polling,
        logging: LoggingConfig { level, json },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `WaitlineError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<WaitlineConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(WaitlineError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            WaitlineError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| WaitlineError::Config(format!("Failed to read config file: {}", e)))?;

    let mut config = parse_config(&contents, &config_path)?;
    config.polling.validate()?;
    resolve_definitions_path(&mut config, &config_path);
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `WaitlineError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<WaitlineConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| WaitlineError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| WaitlineError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(WaitlineError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Relative definition paths in a file are relative to that file
fn resolve_definitions_path(config: &mut WaitlineConfig, config_path: &Path) {
    if let (Some(path), Some(dir)) = (&config.definitions.path, config_path.parent()) {
        if path.is_relative() {
            config.definitions.path = Some(dir.join(path));
        }
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./waitline.{toml,json}`,
///    `./config.{toml,json}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    let names = [
        format!("{CONFIG_FILE_STEM}.toml"),
        format!("{CONFIG_FILE_STEM}.json"),
        "config.toml".to_string(),
        "config.json".to_string(),
    ];
    ["", "..", "../.."]
        .iter()
        .flat_map(|prefix| names.iter().map(move |name| dir.join(prefix).join(name)))
        .collect()
}

/// Parse a boolean flag
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_bool() {
        for value in ["1", "true", "YES", "on", " True "] {
            assert!(parse_bool(value), "{value} should be true");
        }
        for value in ["0", "false", "no", "off", "maybe"] {
            assert!(!parse_bool(value), "{value} should be false");
        }
    }

    #[test]
    fn test_load_from_vars_all_set() {
        let config = load_from_vars(vars(&[
            ("WAITLINE_DEFINITIONS_PATH", "/etc/waitline/waiters"),
            ("WAITLINE_INTERVAL_MS", "250"),
            ("WAITLINE_MAX_ATTEMPTS", "12"),
            ("WAITLINE_LOG_LEVEL", "waitline_core=debug"),
            ("WAITLINE_LOG_JSON", "on"),
        ]))
        .expect("config should load");

        assert_eq!(config.definitions.path, Some(PathBuf::from("/etc/waitline/waiters")));
        assert_eq!(config.polling.interval_override_ms, Some(250));
        assert_eq!(config.polling.max_attempts_override, Some(12));
        assert_eq!(config.logging.level, "waitline_core=debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_load_from_vars_defaults() {
        let config = load_from_vars(vars(&[("WAITLINE_DEFINITIONS_PATH", "waiters.json")]))
            .expect("config should load");

        assert!(config.polling.is_empty());
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_load_from_vars_missing_path() {
        let err = load_from_vars(vars(&[("WAITLINE_MAX_ATTEMPTS", "3")])).unwrap_err();
        assert!(matches!(err, WaitlineError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_vars_invalid_number() {
        let err = load_from_vars(vars(&[
            ("WAITLINE_DEFINITIONS_PATH", "waiters.json"),
            ("WAITLINE_MAX_ATTEMPTS", "many"),
        ]))
        .unwrap_err();
        assert!(err.to_string().starts_with("Configuration error: Invalid max attempts"));
    }

    #[test]
    fn test_load_from_vars_rejects_zero_attempts() {
        let err = load_from_vars(vars(&[
            ("WAITLINE_DEFINITIONS_PATH", "waiters.json"),
            ("WAITLINE_MAX_ATTEMPTS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, WaitlineError::Config(_)));
        assert!(err.to_string().contains("at least 1"), "{err}");
    }

    #[test]
    fn test_load_from_file_rejects_zero_attempts() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("waitline.toml");
        std::fs::write(&path, "[polling]\nmax_attempts_override = 0\n").expect("write config");

        let err = load_from_file(Some(path)).unwrap_err();
        assert!(err.to_string().contains("Invalid max attempts"), "{err}");
    }

    #[test]
    fn test_load_from_env_reads_process_env() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("WAITLINE_DEFINITIONS_PATH", "/tmp/waiters");
        std::env::set_var("WAITLINE_INTERVAL_MS", "0");

        let result = load_from_env();

        std::env::remove_var("WAITLINE_DEFINITIONS_PATH");
        std::env::remove_var("WAITLINE_INTERVAL_MS");

        let config = result.expect("config should load from env");
        assert_eq!(config.polling.interval_override_ms, Some(0));
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "definitions": { "path": "/srv/waiters" },
            "polling": { "interval_override_ms": 100 },
            "logging": { "level": "debug", "json": true }
        }"#;

        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        temp_file.write_all(json_content.as_bytes()).expect("Failed to write to temp file");
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

        let config = load_from_file(Some(path.clone())).expect("config should load");
        assert_eq!(config.definitions.path, Some(PathBuf::from("/srv/waiters")));
        assert_eq!(config.polling.interval_override_ms, Some(100));
        assert!(config.logging.json);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_relative_definitions_path_resolved_against_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("waitline.toml");
        std::fs::write(&path, "[definitions]\npath = \"waiters\"\n").expect("write config");

        let config = load_from_file(Some(path)).expect("config should load");
        assert_eq!(config.definitions.path, Some(dir.path().join("waiters")));
    }

    #[test]
    fn test_load_from_file_missing() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/waitline.toml"))).unwrap_err();
        assert!(matches!(err, WaitlineError::Config(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = parse_config("", Path::new("waitline.yaml")).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: Unsupported config format: yaml");
    }

    #[test]
    fn test_candidates_cover_parents() {
        let candidates = candidates_in(Path::new("/work"));
        assert_eq!(candidates.len(), 12);
        assert_eq!(candidates[0], Path::new("/work").join("").join("waitline.toml"));
        assert!(candidates.contains(&Path::new("/work").join("../..").join("config.json")));
    }
}
