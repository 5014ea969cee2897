//! Custom error types for kcm

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for kcm operations
#[derive(Error, Debug)]
pub enum KcmError {
    #[error("'{tool}' not found on PATH\n\n  {hint}")]
    MissingDependency { tool: String, hint: String },

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("kubeconfig file not found: {0}\n\n  Import a cluster first:\n    kcm -f <kubeconfig-file>")]
    ConfigNotFound(PathBuf),

    #[error("{file}: '{field}' is missing or null\n\n  The file does not look like a valid kubeconfig")]
    ParseError { file: PathBuf, field: String },

    #[error("invalid server URL: '{0}'\n\n  Expected https://<host>[:<port>][/<path>]")]
    InvalidUrl(String),

    #[error("no clusters found in kubeconfig")]
    NoClusters,

    #[error("invalid selection: '{0}'\n\n  Enter a number from the list or an exact cluster name")]
    InvalidSelection(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("command failed: {0}")]
    OperationFailed(String),

    #[error("cannot resolve home directory\n\n  HOME environment variable may not be set")]
    NoHomeDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("{0}")]
    Other(String),
}

impl From<String> for KcmError {
    fn from(s: String) -> Self {
        KcmError::Other(s)
    }
}

/// Result type alias for kcm operations
pub type Result<T> = std::result::Result<T, KcmError>;
