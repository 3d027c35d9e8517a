//! Environment rollout snapshots

use super::{DeploymentStatus, EnvironmentId, ServiceId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The rollout picture of one environment, recorded onto a finished deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvStatus {
    /// Environment the snapshot describes
    pub environment_id: EnvironmentId,
    /// Most recent deployment status per service in the environment
    pub services: BTreeMap<ServiceId, DeploymentStatus>,
    /// Capture timestamp
    pub taken_at: DateTime<Utc>,
}

impl EnvStatus {
    /// Create an empty snapshot for an environment
    pub fn new(environment_id: EnvironmentId) -> Self {
        Self {
            environment_id,
            services: BTreeMap::new(),
            taken_at: Utc::now(),
        }
    }

    /// Record a service's status in the snapshot
    pub fn record(&mut self, service_id: ServiceId, status: DeploymentStatus) {
        self.services.insert(service_id, status);
    }
}
