//! Deployable services

use super::ServiceId;
use serde::{Deserialize, Serialize};

/// A deployable unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    /// Service ID
    pub id: ServiceId,
    /// Service name, used to derive workload names on the cluster
    pub name: String,
    /// Whether the service's workload is subdivided into groups
    #[serde(default)]
    pub is_part_of_group: bool,
}

impl Service {
    /// Create a new service
    pub fn new(id: ServiceId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            is_part_of_group: false,
        }
    }

    /// Mark the service as group-subdivided
    pub fn with_groups(mut self) -> Self {
        self.is_part_of_group = true;
        self
    }
}
