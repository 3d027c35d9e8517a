//! Environment status aggregation
//!
//! Once a deployment is observed terminal, the monitor records what its
//! environment looks like onto the deployment record. The snapshot is the
//! most recent deployment status per service, refreshed with a live poll of
//! the subject deployment.

use crate::cluster::ClusterHandler;
use crate::error::Result;
use crate::models::{Deployment, EnvStatus, ServiceId};
use crate::store::DeploymentStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Computes and records environment snapshots
#[async_trait]
pub trait EnvStatusManager: Send + Sync {
    /// Compute the current snapshot of the deployment's environment
    async fn current_status(
        &self,
        deployment: &Deployment,
        handler: &dyn ClusterHandler,
    ) -> Result<EnvStatus>;

    /// Record a snapshot onto the deployment
    async fn record_status(&self, deployment: &Deployment, status: EnvStatus) -> Result<()>;
}

/// Snapshot manager backed by deployment storage
pub struct StoreEnvStatusManager {
    deployments: Arc<dyn DeploymentStore>,
}

impl StoreEnvStatusManager {
    /// Create a manager over deployment storage
    pub fn new(deployments: Arc<dyn DeploymentStore>) -> Self {
        Self { deployments }
    }
}

#[async_trait]
impl EnvStatusManager for StoreEnvStatusManager {
    async fn current_status(
        &self,
        deployment: &Deployment,
        handler: &dyn ClusterHandler,
    ) -> Result<EnvStatus> {
        let mut snapshot = EnvStatus::new(deployment.environment_id);

        let in_env = self
            .deployments
            .list_for_environment(deployment.environment_id)
            .await?;
        let mut last_seen: HashMap<ServiceId, DateTime<Utc>> = HashMap::new();
        for d in &in_env {
            let newer = last_seen
                .get(&d.service_id)
                .is_none_or(|seen| d.last_update >= *seen);
            if newer {
                last_seen.insert(d.service_id, d.last_update);
                snapshot.record(d.service_id, d.status);
            }
        }

        // The subject's stored status may lag the cluster; poll it live.
        let fresh = handler.monitor_deployment(deployment).await?;
        snapshot.record(deployment.service_id, fresh.status);

        Ok(snapshot)
    }

    async fn record_status(&self, deployment: &Deployment, status: EnvStatus) -> Result<()> {
        self.deployments
            .update_env_status(deployment.id, status)
            .await
    }
}
