//! Deployment target environments

use super::EnvironmentId;
use serde::{Deserialize, Serialize};

/// Cluster backend variant an environment is served by
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterBackend {
    /// Flat workload API, first revision
    #[default]
    RestV1,
    /// Namespaced workload API, second revision
    RestV2,
}

/// A deployment target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    /// Environment ID
    pub id: EnvironmentId,
    /// Human-readable name
    pub name: String,
    /// Backend variant used to construct the cluster handler
    #[serde(default)]
    pub backend: ClusterBackend,
    /// Base URL of the cluster API
    pub cluster_url: String,
    /// Bearer token for the cluster API
    #[serde(default)]
    pub cluster_token: Option<String>,
    /// Namespace workloads are placed in
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Maximum simultaneous non-emergency deployments; absent or < 1 means unlimited
    #[serde(default)]
    pub concurrency_limit: Option<u32>,
}

fn default_namespace() -> String {
    "default".to_string()
}

impl Environment {
    /// Create a new environment
    pub fn new(id: EnvironmentId, name: &str, cluster_url: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            backend: ClusterBackend::default(),
            cluster_url: cluster_url.to_string(),
            cluster_token: None,
            namespace: default_namespace(),
            concurrency_limit: None,
        }
    }

    /// Set the concurrency limit
    pub fn with_concurrency_limit(mut self, limit: u32) -> Self {
        self.concurrency_limit = Some(limit);
        self
    }

    /// Select the cluster backend variant
    pub fn with_backend(mut self, backend: ClusterBackend) -> Self {
        self.backend = backend;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_environment_defaults() {
        let env = Environment::new(1, "staging", "http://cluster.local:8080");
        assert_eq!(env.backend, ClusterBackend::RestV1);
        assert_eq!(env.namespace, "default");
        assert!(env.concurrency_limit.is_none());
    }

    #[test]
    fn test_with_concurrency_limit() {
        let env = Environment::new(1, "prod", "http://cluster.local:8080").with_concurrency_limit(2);
        assert_eq!(env.concurrency_limit, Some(2));
    }
}
