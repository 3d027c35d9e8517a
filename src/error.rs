//! Error types for Capstan

use crate::models::{DeploymentId, EnvironmentId, GroupId, ServiceId};
use thiserror::Error;

/// Result type for Capstan operations
pub type Result<T> = std::result::Result<T, CapstanError>;

/// Capstan error types
#[derive(Error, Debug)]
pub enum CapstanError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Deployment not found: {0}")]
    DeploymentNotFound(DeploymentId),

    #[error("Environment not found: {0}")]
    EnvironmentNotFound(EnvironmentId),

    #[error("Service not found: {0}")]
    ServiceNotFound(ServiceId),

    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    #[error("Cluster handler error: {0}")]
    Cluster(#[from] anyhow::Error),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
