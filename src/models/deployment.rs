//! Deployment records and the rollout status state machine

use super::{DeploymentId, EnvironmentId, ServiceId};
use crate::models::EnvStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    /// Waiting to be started
    #[default]
    Pending,
    /// Rollout handed to the cluster, in progress
    Started,
    /// Cancellation requested, not yet handed to the cluster
    PendingCancellation,
    /// Cancellation in progress on the cluster
    Canceling,
    /// Rollout finished
    Done,
    /// Rollout canceled
    Canceled,
}

impl DeploymentStatus {
    /// Check if the status is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentStatus::Done | DeploymentStatus::Canceled)
    }

    /// Check if the cluster is actively working this deployment. Ongoing
    /// deployments occupy a concurrency slot; a PENDING one does not, it is
    /// still waiting for a slot.
    pub fn is_ongoing(&self) -> bool {
        matches!(
            self,
            DeploymentStatus::Started
                | DeploymentStatus::PendingCancellation
                | DeploymentStatus::Canceling
        )
    }

    /// Status name as used in logs and wire payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Started => "started",
            DeploymentStatus::PendingCancellation => "pending_cancellation",
            DeploymentStatus::Canceling => "canceling",
            DeploymentStatus::Done => "done",
            DeploymentStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of rollout work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    /// Deployment ID
    pub id: DeploymentId,
    /// Target environment ID
    pub environment_id: EnvironmentId,
    /// Service being rolled out
    pub service_id: ServiceId,
    /// Version being rolled out
    pub deployable_version: String,
    /// Target group for group-scoped rollouts
    #[serde(default)]
    pub group_name: Option<String>,
    /// Email of the user who requested the deployment
    #[serde(default)]
    pub initiator: String,
    /// Current status
    #[serde(default)]
    pub status: DeploymentStatus,
    /// Bypasses concurrency limiting when set
    #[serde(default)]
    pub emergency: bool,
    /// Environment snapshot recorded once the deployment finished
    #[serde(default)]
    pub env_status: Option<EnvStatus>,
    /// Creation timestamp
    #[serde(default = "default_timestamp")]
    pub started_at: DateTime<Utc>,
    /// Last status change timestamp
    #[serde(default = "default_timestamp")]
    pub last_update: DateTime<Utc>,
}

fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

impl Deployment {
    /// Create a new pending deployment
    pub fn new(
        id: DeploymentId,
        environment_id: EnvironmentId,
        service_id: ServiceId,
        deployable_version: &str,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            environment_id,
            service_id,
            deployable_version: deployable_version.to_string(),
            group_name: None,
            initiator: String::new(),
            status: DeploymentStatus::Pending,
            emergency: false,
            env_status: None,
            started_at: now,
            last_update: now,
        }
    }

    /// Set the initial status
    pub fn with_status(mut self, status: DeploymentStatus) -> Self {
        self.status = status;
        self
    }

    /// Mark as an emergency deployment
    pub fn with_emergency(mut self, emergency: bool) -> Self {
        self.emergency = emergency;
        self
    }

    /// Target a specific workload group
    pub fn with_group(mut self, group_name: &str) -> Self {
        self.group_name = Some(group_name.to_string());
        self
    }

    /// Set the initiating user
    pub fn with_initiator(mut self, initiator: &str) -> Self {
        self.initiator = initiator.to_string();
        self
    }

    /// Check if the deployment reached a terminal status
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_deployment_is_pending() {
        let deployment = Deployment::new(1, 10, 100, "v1.2.3");
        assert_eq!(deployment.status, DeploymentStatus::Pending);
        assert!(!deployment.emergency);
        assert!(deployment.env_status.is_none());
        assert!(!deployment.is_terminal());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(DeploymentStatus::Done.is_terminal());
        assert!(DeploymentStatus::Canceled.is_terminal());
        assert!(!DeploymentStatus::Pending.is_terminal());
        assert!(!DeploymentStatus::Started.is_terminal());
        assert!(!DeploymentStatus::PendingCancellation.is_terminal());
        assert!(!DeploymentStatus::Canceling.is_terminal());
    }

    #[test]
    fn test_ongoing_statuses_hold_a_concurrency_slot() {
        assert!(DeploymentStatus::Started.is_ongoing());
        assert!(DeploymentStatus::PendingCancellation.is_ongoing());
        assert!(DeploymentStatus::Canceling.is_ongoing());

        // Waiting and finished deployments do not hold a slot.
        assert!(!DeploymentStatus::Pending.is_ongoing());
        assert!(!DeploymentStatus::Done.is_ongoing());
        assert!(!DeploymentStatus::Canceled.is_ongoing());
    }

    #[test]
    fn test_builder_helpers() {
        let deployment = Deployment::new(2, 10, 100, "v2")
            .with_status(DeploymentStatus::Started)
            .with_emergency(true)
            .with_group("workers")
            .with_initiator("ops@example.com");

        assert_eq!(deployment.status, DeploymentStatus::Started);
        assert!(deployment.emergency);
        assert_eq!(deployment.group_name, Some("workers".to_string()));
        assert_eq!(deployment.initiator, "ops@example.com");
    }
}
