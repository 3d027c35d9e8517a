//! REST cluster handler variants

use super::{ClusterHandler, ScaleOutcome};
use crate::models::{Deployment, DeploymentStatus, Environment, Service, ServiceId};
use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Request timeout for cluster API calls, in seconds
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Wire dialect spoken by the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Flat workload paths: `/api/v1/workloads/{name}`
    V1,
    /// Namespaced workload paths: `/api/v2/namespaces/{ns}/workloads/{name}`
    V2,
}

/// Cluster handler speaking the JSON workload API
#[derive(Debug)]
pub struct RestClusterHandler {
    /// HTTP client
    client: reqwest::Client,
    /// Cluster API base URL
    base_url: String,
    /// Bearer token
    token: Option<String>,
    /// Workload namespace
    namespace: String,
    /// Wire dialect
    dialect: Dialect,
}

impl RestClusterHandler {
    /// Create a handler for an environment
    pub fn new(environment: &Environment, dialect: Dialect) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: environment.cluster_url.trim_end_matches('/').to_string(),
            token: environment.cluster_token.clone(),
            namespace: environment.namespace.clone(),
            dialect,
        })
    }

    /// Build the URL for a workload resource
    fn workload_url(&self, name: &str) -> String {
        match self.dialect {
            Dialect::V1 => format!("{}/api/v1/workloads/{}", self.base_url, name),
            Dialect::V2 => format!(
                "{}/api/v2/namespaces/{}/workloads/{}",
                self.base_url, self.namespace, name
            ),
        }
    }

    /// Fetch a workload's phase and map it onto a deployment status
    async fn fetch_status(&self, name: &str) -> anyhow::Result<DeploymentStatus> {
        let url = format!("{}/status", self.workload_url(name));

        let mut request = self.client.get(&url);

        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to fetch workload {} status: {}",
                name,
                response.status()
            ));
        }

        let status: WorkloadStatusResponse = response.json().await?;
        phase_to_status(&status.phase)
    }
}

#[async_trait]
impl ClusterHandler for RestClusterHandler {
    async fn start_deployment(&self, deployment: &Deployment) -> anyhow::Result<Deployment> {
        let name = workload_name_for(deployment);
        let url = self.workload_url(&name);
        let body = ApplyWorkloadRequest {
            version: &deployment.deployable_version,
            group: deployment.group_name.as_deref(),
        };

        let mut request = self.client.put(&url).json(&body);

        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to apply workload {}: {}",
                name,
                response.status()
            ));
        }

        let status: WorkloadStatusResponse = response.json().await?;
        let mut next = deployment.clone();
        next.status = phase_to_status(&status.phase)?;
        Ok(next)
    }

    async fn cancel_deployment(&self, deployment: &Deployment) -> anyhow::Result<Deployment> {
        let name = workload_name_for(deployment);
        let url = format!("{}/cancel", self.workload_url(&name));

        let mut request = self.client.post(&url);

        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to cancel workload {}: {}",
                name,
                response.status()
            ));
        }

        let status: WorkloadStatusResponse = response.json().await?;
        let mut next = deployment.clone();
        next.status = phase_to_status(&status.phase)?;
        Ok(next)
    }

    async fn monitor_deployment(&self, deployment: &Deployment) -> anyhow::Result<Deployment> {
        let name = workload_name_for(deployment);
        let mut next = deployment.clone();
        next.status = self.fetch_status(&name).await?;
        Ok(next)
    }

    async fn set_scaling_factor(
        &self,
        service: &Service,
        group_name: &str,
        factor: u32,
    ) -> anyhow::Result<ScaleOutcome> {
        let name = workload_name(service.id, Some(group_name));
        let url = format!("{}/scale", self.workload_url(&name));
        let body = ScaleWorkloadRequest { replicas: factor };

        let mut request = self.client.put(&url).json(&body);

        if let Some(ref token) = self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;

        match scale_outcome_for(response.status()) {
            Some(outcome) => Ok(outcome),
            None => Err(anyhow!(
                "Failed to scale workload {}: {}",
                name,
                response.status()
            )),
        }
    }
}

/// Workload name for a service, with the group suffix for group-scoped workloads
pub fn workload_name(service_id: ServiceId, group_name: Option<&str>) -> String {
    match group_name {
        Some(group) => format!("svc-{}-{}", service_id, group),
        None => format!("svc-{}", service_id),
    }
}

fn workload_name_for(deployment: &Deployment) -> String {
    workload_name(deployment.service_id, deployment.group_name.as_deref())
}

/// Map a reported workload phase onto a deployment status
fn phase_to_status(phase: &str) -> anyhow::Result<DeploymentStatus> {
    match phase {
        "accepted" | "progressing" => Ok(DeploymentStatus::Started),
        "available" | "complete" => Ok(DeploymentStatus::Done),
        "canceling" => Ok(DeploymentStatus::Canceling),
        "canceled" => Ok(DeploymentStatus::Canceled),
        other => Err(anyhow!("Unknown workload phase: {}", other)),
    }
}

/// Map a scale response status onto an outcome; `None` means transient failure
fn scale_outcome_for(status: reqwest::StatusCode) -> Option<ScaleOutcome> {
    if status.is_success() {
        Some(ScaleOutcome::Applied)
    } else if status == reqwest::StatusCode::NOT_FOUND {
        Some(ScaleOutcome::TargetMissing)
    } else {
        None
    }
}

/// Workload apply request
#[derive(Debug, Serialize)]
struct ApplyWorkloadRequest<'a> {
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
}

/// Workload scale request
#[derive(Debug, Serialize)]
struct ScaleWorkloadRequest {
    replicas: u32,
}

/// Workload status response
#[derive(Debug, Deserialize)]
struct WorkloadStatusResponse {
    phase: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClusterBackend;

    fn test_environment(backend: ClusterBackend) -> Environment {
        Environment::new(1, "staging", "http://cluster.local:8080/").with_backend(backend)
    }

    #[test]
    fn test_workload_url_v1() {
        let handler =
            RestClusterHandler::new(&test_environment(ClusterBackend::RestV1), Dialect::V1)
                .unwrap();
        assert_eq!(
            handler.workload_url("svc-100"),
            "http://cluster.local:8080/api/v1/workloads/svc-100"
        );
    }

    #[test]
    fn test_workload_url_v2_namespaced() {
        let handler =
            RestClusterHandler::new(&test_environment(ClusterBackend::RestV2), Dialect::V2)
                .unwrap();
        assert_eq!(
            handler.workload_url("svc-100"),
            "http://cluster.local:8080/api/v2/namespaces/default/workloads/svc-100"
        );
    }

    #[test]
    fn test_workload_name_with_group() {
        assert_eq!(workload_name(100, Some("workers")), "svc-100-workers");
        assert_eq!(workload_name(100, None), "svc-100");
    }

    #[test]
    fn test_phase_mapping() {
        assert_eq!(
            phase_to_status("progressing").unwrap(),
            DeploymentStatus::Started
        );
        assert_eq!(phase_to_status("complete").unwrap(), DeploymentStatus::Done);
        assert_eq!(
            phase_to_status("canceling").unwrap(),
            DeploymentStatus::Canceling
        );
        assert_eq!(
            phase_to_status("canceled").unwrap(),
            DeploymentStatus::Canceled
        );
        assert!(phase_to_status("exploded").is_err());
    }

    #[test]
    fn test_scale_outcome_mapping() {
        assert_eq!(
            scale_outcome_for(reqwest::StatusCode::OK),
            Some(ScaleOutcome::Applied)
        );
        assert_eq!(
            scale_outcome_for(reqwest::StatusCode::NOT_FOUND),
            Some(ScaleOutcome::TargetMissing)
        );
        assert_eq!(scale_outcome_for(reqwest::StatusCode::BAD_GATEWAY), None);
    }
}
