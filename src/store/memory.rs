//! In-memory storage backend

use super::{DeploymentStore, EnvironmentStore, GroupStore, ServiceStore, SlaveStore};
use crate::error::{CapstanError, Result};
use crate::models::{
    Deployment, DeploymentId, DeploymentStatus, EnvStatus, Environment, EnvironmentId, Group,
    GroupId, ScalingStatus, Service, ServiceId, SlaveClaim,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory implementation of every storage trait
///
/// Backs tests and local runs. A terminal deployment stays in the
/// `list_running` working set until its environment snapshot is recorded,
/// so the monitor observes it terminal exactly once more.
#[derive(Default)]
pub struct MemoryStore {
    deployments: RwLock<HashMap<DeploymentId, Deployment>>,
    environments: RwLock<HashMap<EnvironmentId, Environment>>,
    groups: RwLock<HashMap<GroupId, Group>>,
    services: RwLock<HashMap<ServiceId, Service>>,
    claims: RwLock<Vec<SlaveClaim>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a deployment
    pub fn add_deployment(&self, deployment: Deployment) -> Result<()> {
        let mut deployments = self
            .deployments
            .write()
            .map_err(|_| CapstanError::Lock("Failed to acquire deployments lock".to_string()))?;
        deployments.insert(deployment.id, deployment);
        Ok(())
    }

    /// Insert an environment
    pub fn add_environment(&self, environment: Environment) -> Result<()> {
        let mut environments = self
            .environments
            .write()
            .map_err(|_| CapstanError::Lock("Failed to acquire environments lock".to_string()))?;
        environments.insert(environment.id, environment);
        Ok(())
    }

    /// Insert a group
    pub fn add_group(&self, group: Group) -> Result<()> {
        let mut groups = self
            .groups
            .write()
            .map_err(|_| CapstanError::Lock("Failed to acquire groups lock".to_string()))?;
        groups.insert(group.id, group);
        Ok(())
    }

    /// Insert a service
    pub fn add_service(&self, service: Service) -> Result<()> {
        let mut services = self
            .services
            .write()
            .map_err(|_| CapstanError::Lock("Failed to acquire services lock".to_string()))?;
        services.insert(service.id, service);
        Ok(())
    }

    /// Fetch a deployment by id
    pub fn get_deployment(&self, id: DeploymentId) -> Result<Option<Deployment>> {
        let deployments = self
            .deployments
            .read()
            .map_err(|_| CapstanError::Lock("Failed to acquire deployments lock".to_string()))?;
        Ok(deployments.get(&id).cloned())
    }

    /// Fetch a group by id
    pub fn get_group(&self, id: GroupId) -> Result<Option<Group>> {
        let groups = self
            .groups
            .read()
            .map_err(|_| CapstanError::Lock("Failed to acquire groups lock".to_string()))?;
        Ok(groups.get(&id).cloned())
    }
}

#[async_trait]
impl DeploymentStore for MemoryStore {
    async fn list_running(&self) -> Result<Vec<Deployment>> {
        let deployments = self
            .deployments
            .read()
            .map_err(|_| CapstanError::Lock("Failed to acquire deployments lock".to_string()))?;
        let mut running: Vec<Deployment> = deployments
            .values()
            .filter(|d| !d.status.is_terminal() || d.env_status.is_none())
            .cloned()
            .collect();
        running.sort_by_key(|d| d.id);
        Ok(running)
    }

    async fn list_ongoing(&self) -> Result<Vec<Deployment>> {
        let deployments = self
            .deployments
            .read()
            .map_err(|_| CapstanError::Lock("Failed to acquire deployments lock".to_string()))?;
        let mut ongoing: Vec<Deployment> = deployments
            .values()
            .filter(|d| d.status.is_ongoing())
            .cloned()
            .collect();
        ongoing.sort_by_key(|d| d.id);
        Ok(ongoing)
    }

    async fn list_for_environment(
        &self,
        environment_id: EnvironmentId,
    ) -> Result<Vec<Deployment>> {
        let deployments = self
            .deployments
            .read()
            .map_err(|_| CapstanError::Lock("Failed to acquire deployments lock".to_string()))?;
        let mut in_env: Vec<Deployment> = deployments
            .values()
            .filter(|d| d.environment_id == environment_id)
            .cloned()
            .collect();
        in_env.sort_by_key(|d| d.id);
        Ok(in_env)
    }

    async fn update_status(&self, id: DeploymentId, status: DeploymentStatus) -> Result<()> {
        let mut deployments = self
            .deployments
            .write()
            .map_err(|_| CapstanError::Lock("Failed to acquire deployments lock".to_string()))?;
        let deployment = deployments
            .get_mut(&id)
            .ok_or(CapstanError::DeploymentNotFound(id))?;
        deployment.status = status;
        deployment.last_update = Utc::now();
        Ok(())
    }

    async fn update_env_status(&self, id: DeploymentId, snapshot: EnvStatus) -> Result<()> {
        let mut deployments = self
            .deployments
            .write()
            .map_err(|_| CapstanError::Lock("Failed to acquire deployments lock".to_string()))?;
        let deployment = deployments
            .get_mut(&id)
            .ok_or(CapstanError::DeploymentNotFound(id))?;
        deployment.env_status = Some(snapshot);
        Ok(())
    }
}

#[async_trait]
impl EnvironmentStore for MemoryStore {
    async fn get(&self, id: EnvironmentId) -> Result<Environment> {
        let environments = self
            .environments
            .read()
            .map_err(|_| CapstanError::Lock("Failed to acquire environments lock".to_string()))?;
        environments
            .get(&id)
            .cloned()
            .ok_or(CapstanError::EnvironmentNotFound(id))
    }

    async fn list_all(&self) -> Result<Vec<Environment>> {
        let environments = self
            .environments
            .read()
            .map_err(|_| CapstanError::Lock("Failed to acquire environments lock".to_string()))?;
        let mut all: Vec<Environment> = environments.values().cloned().collect();
        all.sort_by_key(|e| e.id);
        Ok(all)
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn list_running_scaling_operations(&self) -> Result<Vec<Group>> {
        let groups = self
            .groups
            .read()
            .map_err(|_| CapstanError::Lock("Failed to acquire groups lock".to_string()))?;
        let mut pending: Vec<Group> = groups
            .values()
            .filter(|g| g.scaling_pending())
            .cloned()
            .collect();
        pending.sort_by_key(|g| g.id);
        Ok(pending)
    }

    async fn update_scaling_status(&self, id: GroupId, status: ScalingStatus) -> Result<()> {
        let mut groups = self
            .groups
            .write()
            .map_err(|_| CapstanError::Lock("Failed to acquire groups lock".to_string()))?;
        let group = groups.get_mut(&id).ok_or(CapstanError::GroupNotFound(id))?;
        group.scaling_status = status;
        Ok(())
    }
}

#[async_trait]
impl ServiceStore for MemoryStore {
    async fn get(&self, id: ServiceId) -> Result<Service> {
        let services = self
            .services
            .read()
            .map_err(|_| CapstanError::Lock("Failed to acquire services lock".to_string()))?;
        services
            .get(&id)
            .cloned()
            .ok_or(CapstanError::ServiceNotFound(id))
    }
}

#[async_trait]
impl SlaveStore for MemoryStore {
    async fn put_claim(&self, claim: SlaveClaim) -> Result<()> {
        let mut claims = self
            .claims
            .write()
            .map_err(|_| CapstanError::Lock("Failed to acquire claims lock".to_string()))?;
        claims.retain(|c| {
            c.instance != claim.instance || c.environment_id != claim.environment_id
        });
        claims.push(claim);
        Ok(())
    }

    async fn remove_instance_claims(&self, instance: &str) -> Result<()> {
        let mut claims = self
            .claims
            .write()
            .map_err(|_| CapstanError::Lock("Failed to acquire claims lock".to_string()))?;
        claims.retain(|c| c.instance != instance);
        Ok(())
    }

    async fn refresh_keepalive(&self, instance: &str, at: DateTime<Utc>) -> Result<()> {
        let mut claims = self
            .claims
            .write()
            .map_err(|_| CapstanError::Lock("Failed to acquire claims lock".to_string()))?;
        for claim in claims.iter_mut().filter(|c| c.instance == instance) {
            claim.last_keepalive = at;
        }
        Ok(())
    }

    async fn list_claims(&self) -> Result<Vec<SlaveClaim>> {
        let claims = self
            .claims
            .read()
            .map_err(|_| CapstanError::Lock("Failed to acquire claims lock".to_string()))?;
        Ok(claims.clone())
    }
}
