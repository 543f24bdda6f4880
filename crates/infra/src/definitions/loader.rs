//! Waiters document loader
//!
//! A definitions path is either a single document or a directory. In a
//! directory every `*.json` and `*.toml` file is loaded in file name order,
//! and a waiter defined in a later file replaces one with the same name
//! from an earlier file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument};
use waitline_common::{CommonError, ErrorClassification, ErrorSeverity};
use waitline_core::WaiterRegistry;
use waitline_domain::{DefinitionError, DefinitionsConfig, WaitersDocument};

/// Failure to turn files on disk into a registry
#[derive(Debug, Error)]
pub enum LoadError {
    /// Reading or decoding a file failed
    #[error("{}: {source}", .path.display())]
    Common {
        path: PathBuf,
        #[source]
        source: CommonError,
    },

    /// The document decoded but does not describe valid waiters
    #[error("{}: {source}", .path.display())]
    Definition {
        path: PathBuf,
        #[source]
        source: DefinitionError,
    },

    #[error("unsupported waiters document format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("no waiters documents found in {}", .0.display())]
    NoDocuments(PathBuf),

    #[error("no definitions path configured")]
    NotConfigured,
}

impl LoadError {
    fn common(path: &Path, source: impl Into<CommonError>) -> Self {
        Self::Common { path: path.to_path_buf(), source: source.into() }
    }

    fn definition(path: &Path, source: DefinitionError) -> Self {
        Self::Definition { path: path.to_path_buf(), source }
    }
}

impl ErrorClassification for LoadError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Common { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Common { source, .. } => source.severity(),
            Self::Definition { .. } => ErrorSeverity::Critical,
            Self::UnsupportedFormat(_) | Self::NoDocuments(_) | Self::NotConfigured => {
                ErrorSeverity::Error
            }
        }
    }

    fn is_critical(&self) -> bool {
        match self {
            Self::Common { source, .. } => source.is_critical(),
            Self::Definition { .. } => true,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Read, decode and validate one waiters document
///
/// The format is chosen by extension: `.json` or `.toml`.
///
/// # Errors
/// - `LoadError::UnsupportedFormat` for any other extension
/// - `LoadError::Common` if the file cannot be read or decoded
/// - `LoadError::Definition` if the document fails validation
pub fn load_document(path: &Path) -> Result<WaitersDocument, LoadError> {
    let format = document_format(path).ok_or_else(|| LoadError::UnsupportedFormat(path.into()))?;
    let contents = std::fs::read_to_string(path).map_err(|e| LoadError::common(path, e))?;

    let document: WaitersDocument = match format {
        Format::Json => serde_json::from_str(&contents).map_err(|e| LoadError::common(path, e))?,
        Format::Toml => toml::from_str(&contents).map_err(|e| LoadError::common(path, e))?,
    };
    document.validate().map_err(|e| LoadError::definition(path, e))?;

    debug!(path = %path.display(), waiters = document.waiters.len(), "Loaded waiters document");
    Ok(document)
}

/// Build a registry from a document or a directory of documents
///
/// # Errors
/// - `LoadError::NoDocuments` if a directory holds no `.json`/`.toml` files
/// - Any error from [`load_document`]
/// - `LoadError::Definition` if an acceptor fails to compile
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_registry(path: &Path) -> Result<WaiterRegistry, LoadError> {
    let files = if path.is_dir() { document_files(path)? } else { vec![path.to_path_buf()] };

    let mut builder = WaiterRegistry::builder();
    for file in &files {
        let document = load_document(file)?;
        builder = builder.document(&document).map_err(|e| LoadError::definition(file, e))?;
    }
    let registry = builder.build();

    info!(documents = files.len(), waiters = registry.len(), "Waiter registry loaded");
    Ok(registry)
}

/// [`load_registry`] for the configured definitions path
///
/// # Errors
/// `LoadError::NotConfigured` when no path is set, otherwise as
/// [`load_registry`].
pub fn registry_from_config(config: &DefinitionsConfig) -> Result<WaiterRegistry, LoadError> {
    let path = config.path.as_deref().ok_or(LoadError::NotConfigured)?;
    load_registry(path)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

fn document_format(path: &Path) -> Option<Format> {
    match path.extension().and_then(|e| e.to_str())? {
        "json" => Some(Format::Json),
        "toml" => Some(Format::Toml),
        _ => None,
    }
}

fn document_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|e| LoadError::common(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| LoadError::common(dir, e))?.path();
        if path.is_file() && document_format(&path).is_some() {
            files.push(path);
        }
    }
    if files.is_empty() {
        return Err(LoadError::NoDocuments(dir.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    const READY_JSON: &str = r#"{
        "version": 2,
        "waiters": {
            "TableExists": {
                "operation": "DescribeTable",
                "delay": 20,
                "maxAttempts": 25,
                "acceptors": [
                    {"matcher": "path", "argument": "Table.TableStatus", "expected": "ACTIVE", "state": "success"},
                    {"matcher": "error", "expected": "ResourceNotFoundException", "state": "retry"}
                ]
            }
        }
    }"#;

    const OVERRIDE_TOML: &str = r#"
version = 2

[waiters.TableExists]
operation = "DescribeTable"
delay = 1
maxAttempts = 3

[[waiters.TableExists.acceptors]]
matcher = "path"
argument = "Table.TableStatus"
expected = "ACTIVE"
state = "success"

[waiters.TableNotExists]
operation = "DescribeTable"

[[waiters.TableNotExists.acceptors]]
matcher = "error"
expected = "ResourceNotFoundException"
state = "success"
"#;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("write fixture");
        path
    }

    #[test]
    fn test_load_json_document() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write(dir.path(), "dynamodb.json", READY_JSON);

        let document = load_document(&path).expect("document should load");
        assert_eq!(document.waiters.len(), 1);
        assert_eq!(document.waiters["TableExists"].max_attempts, 25);
    }

    #[test]
    fn test_directory_later_file_replaces_waiter() {
        let dir = tempfile::tempdir().expect("temp dir");
        write(dir.path(), "10-dynamodb.json", READY_JSON);
        write(dir.path(), "20-overrides.toml", OVERRIDE_TOML);
        write(dir.path(), "README.md", "not a document");

        let registry = load_registry(dir.path()).expect("registry should load");
        assert_eq!(registry.waiter_names(), vec!["table_exists", "table_not_exists"]);

        let table_exists = registry.lookup("TableExists").expect("registered");
        assert_eq!(table_exists.interval(), Duration::from_secs(1));
        assert_eq!(table_exists.acceptors().len(), 1);
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_registry(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::NoDocuments(_)));
        assert_eq!(err.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_document(Path::new("waiters.yaml")).unwrap_err();
        assert_eq!(err.to_string(), "unsupported waiters document format: waiters.yaml");
    }

    #[test]
    fn test_missing_file_is_persistence_error() {
        let err = load_document(Path::new("/nonexistent/waiters.json")).unwrap_err();
        match err {
            LoadError::Common { source: CommonError::Persistence { .. }, .. } => {}
            other => panic!("expected persistence error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_toml_is_serialization_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write(dir.path(), "broken.toml", "version = [");

        let err = load_document(&path).unwrap_err();
        assert!(err.to_string().contains("Serialization error (TOML)"), "{err}");
        assert!(!err.is_critical());
    }

    #[test]
    fn test_invalid_definition_is_critical() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write(
            dir.path(),
            "bad.json",
            r#"{"version": 2, "waiters": {"Empty": {"operation": "Describe", "acceptors": []}}}"#,
        );

        let err = load_document(&path).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Definition { source: DefinitionError::NoAcceptors { .. }, .. }
        ));
        assert!(err.is_critical());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_filter_expression_document_loads() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write(
            dir.path(),
            "ecs.json",
            r#"{
                "version": 2,
                "waiters": {
                    "ServicesStable": {
                        "operation": "DescribeServices",
                        "delay": 15,
                        "maxAttempts": 40,
                        "acceptors": [
                            {"matcher": "pathAny", "argument": "failures[].reason", "expected": "MISSING", "state": "failure"},
                            {"matcher": "path", "argument": "length(services[?!(length(deployments) == `1` && runningCount == desiredCount)]) == `0`", "expected": true, "state": "success"}
                        ]
                    }
                }
            }"#,
        );

        let registry = load_registry(&path).expect("filter expressions should compile");
        let condition = registry.lookup("ServicesStable").expect("registered");
        assert_eq!(condition.acceptors().len(), 2);
    }

    #[test]
    fn test_registry_from_config_requires_path() {
        let err = registry_from_config(&DefinitionsConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::NotConfigured));
    }
}
