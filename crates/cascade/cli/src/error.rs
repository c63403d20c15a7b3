//! CLI error types

use cascade_types::CascadeError;
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Catalog, profile or resolution failure
    #[error(transparent)]
    Cascade(#[from] CascadeError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Profile or file not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Some of several profiles failed; each failure was already reported
    #[error("{failed} of {total} profiles failed")]
    ProfilesFailed { failed: usize, total: usize },

    /// Blocking resolution task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
