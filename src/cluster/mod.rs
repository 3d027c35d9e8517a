//! Cluster handler abstraction
//!
//! A handler performs the actual start/cancel/monitor/scale operations
//! against one environment's orchestration backend. Handlers are constructed
//! per environment by [`HandlerCache`] and reused for the process lifetime.
//! All operations must be idempotent or convergent from the cluster's
//! perspective; the monitor relies on that when environment ownership moves
//! between instances.

pub mod cache;
pub mod rest;

pub use cache::{HandlerCache, HandlerFactory};
pub use rest::{Dialect, RestClusterHandler};

use crate::models::{Deployment, Service};
use async_trait::async_trait;
use std::fmt;

/// Result of applying a scaling factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleOutcome {
    /// The scaling factor was applied to the workload group
    Applied,
    /// The target workload no longer exists on the cluster
    TargetMissing,
}

/// Operations a cluster backend must support
///
/// Each call returns the deployment with its status updated from the
/// cluster's view; transient failures travel on the error channel.
#[async_trait]
pub trait ClusterHandler: fmt::Debug + Send + Sync {
    /// Hand a pending deployment to the cluster
    async fn start_deployment(&self, deployment: &Deployment) -> anyhow::Result<Deployment>;

    /// Ask the cluster to cancel a deployment
    async fn cancel_deployment(&self, deployment: &Deployment) -> anyhow::Result<Deployment>;

    /// Poll the cluster for a deployment's current status
    async fn monitor_deployment(&self, deployment: &Deployment) -> anyhow::Result<Deployment>;

    /// Resize a workload group to the desired factor
    async fn set_scaling_factor(
        &self,
        service: &Service,
        group_name: &str,
        factor: u32,
    ) -> anyhow::Result<ScaleOutcome>;
}
