//! Workload groups and scaling operations

use super::{EnvironmentId, GroupId, ServiceId};
use serde::{Deserialize, Serialize};

/// Scaling operation status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingStatus {
    /// Scaling factor not yet applied to the cluster
    #[default]
    Pending,
    /// Scaling factor applied (or the operation was abandoned)
    Done,
}

/// A named subdivision of a service's workload within an environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Group ID
    pub id: GroupId,
    /// Group name
    pub name: String,
    /// Service the group belongs to
    pub service_id: ServiceId,
    /// Environment the group runs in
    pub environment_id: EnvironmentId,
    /// Desired number of workload replicas
    pub scaling_factor: u32,
    /// Scaling operation status
    #[serde(default)]
    pub scaling_status: ScalingStatus,
}

impl Group {
    /// Create a new group with a pending scaling operation
    pub fn new(
        id: GroupId,
        name: &str,
        service_id: ServiceId,
        environment_id: EnvironmentId,
        scaling_factor: u32,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            service_id,
            environment_id,
            scaling_factor,
            scaling_status: ScalingStatus::Pending,
        }
    }

    /// Check if the scaling operation still needs to be applied
    pub fn scaling_pending(&self) -> bool {
        self.scaling_status == ScalingStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_group_scaling_pending() {
        let group = Group::new(1, "workers", 100, 10, 3);
        assert!(group.scaling_pending());
        assert_eq!(group.scaling_factor, 3);
    }
}
