//! Error types for vm-bootstrap

use thiserror::Error;

/// Main error type for vm-bootstrap operations
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Aborted: {0}")]
    Aborted(String),

    #[error("Privilege error: {0}")]
    Privilege(String),

    #[error("Network configuration rejected: {0}")]
    NetplanValidation(String),

    #[error("Marker write failed: {0}")]
    Marker(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Command execution failed: {0}")]
    Command(String),
}
