//! Storage boundary consumed by the reconciliation monitor
//!
//! Each trait mirrors the queries the monitor needs; any durable backend can
//! implement them. [`MemoryStore`] is the in-process implementation used by
//! tests and local runs.

pub mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::models::{
    Deployment, DeploymentId, DeploymentStatus, EnvStatus, Environment, EnvironmentId, Group,
    GroupId, ScalingStatus, Service, ServiceId, SlaveClaim,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Deployment persistence
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// Deployments the reconciliation pass works through: every non-terminal
    /// deployment plus terminal ones whose environment snapshot is not yet
    /// recorded, ascending by id
    async fn list_running(&self) -> Result<Vec<Deployment>>;

    /// Deployments the cluster is actively working (started or somewhere in
    /// cancellation), ascending by id. These are the ones that hold a
    /// concurrency slot; PENDING deployments do not.
    async fn list_ongoing(&self) -> Result<Vec<Deployment>>;

    /// All deployments targeting one environment, ascending by id
    async fn list_for_environment(&self, environment_id: EnvironmentId)
        -> Result<Vec<Deployment>>;

    /// Persist a deployment's status
    async fn update_status(&self, id: DeploymentId, status: DeploymentStatus) -> Result<()>;

    /// Persist a deployment's environment snapshot
    async fn update_env_status(&self, id: DeploymentId, snapshot: EnvStatus) -> Result<()>;
}

/// Environment persistence
#[async_trait]
pub trait EnvironmentStore: Send + Sync {
    /// Fetch one environment
    async fn get(&self, id: EnvironmentId) -> Result<Environment>;

    /// All known environments, ascending by id
    async fn list_all(&self) -> Result<Vec<Environment>>;
}

/// Group persistence
#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Groups whose scaling operation has not been applied yet, ascending by id
    async fn list_running_scaling_operations(&self) -> Result<Vec<Group>>;

    /// Persist a group's scaling status
    async fn update_scaling_status(&self, id: GroupId, status: ScalingStatus) -> Result<()>;
}

/// Service persistence
#[async_trait]
pub trait ServiceStore: Send + Sync {
    /// Fetch one service
    async fn get(&self, id: ServiceId) -> Result<Service>;
}

/// Slave claim persistence
#[async_trait]
pub trait SlaveStore: Send + Sync {
    /// Insert or replace a claim for (instance, environment)
    async fn put_claim(&self, claim: SlaveClaim) -> Result<()>;

    /// Drop every claim held by an instance
    async fn remove_instance_claims(&self, instance: &str) -> Result<()>;

    /// Refresh the keepalive on every claim held by an instance
    async fn refresh_keepalive(&self, instance: &str, at: DateTime<Utc>) -> Result<()>;

    /// All claims, any order
    async fn list_claims(&self) -> Result<Vec<SlaveClaim>>;
}
