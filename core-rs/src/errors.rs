//! Error types for portseek

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PortError {
    /// Every stage of the resolution cascade came up empty
    #[error("{0}")]
    Exhausted(String),

    /// The OS refused to hand out an ephemeral port
    #[error("{0}")]
    RandomAssignment(String),

    #[error("{0}")]
    WaitTimeout(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PortError>;
