//! Core data model: deployments, environments, groups, services, slave claims

pub mod deployment;
pub mod env_status;
pub mod environment;
pub mod group;
pub mod service;
pub mod slave;

pub use deployment::{Deployment, DeploymentStatus};
pub use env_status::EnvStatus;
pub use environment::{ClusterBackend, Environment};
pub use group::{Group, ScalingStatus};
pub use service::Service;
pub use slave::SlaveClaim;

/// Environment identifier
pub type EnvironmentId = i32;

/// Service identifier
pub type ServiceId = i32;

/// Deployment identifier
pub type DeploymentId = i32;

/// Group identifier
pub type GroupId = i32;
