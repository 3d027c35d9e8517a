//! Deployment reconciliation monitor
//!
//! One monitor instance periodically reconciles durable deployment state
//! against the clusters it is responsible for. Every cycle resolves the
//! instance's environment scope, walks the deployment working set driving
//! each deployment through its status state machine, then applies pending
//! scaling operations. All decisions are recomputed from durable state, so
//! a partially applied cycle self-heals on the next one.

pub mod limits;
pub mod report;
mod scaling;
pub mod scheduler;
pub mod scope;

pub use report::CycleReport;
pub use scheduler::MonitorHandle;

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::cluster::HandlerCache;
use crate::error::Result;
use crate::models::{Deployment, DeploymentStatus};
use crate::registry::SlaveRegistry;
use crate::status::EnvStatusManager;
use crate::store::{DeploymentStore, EnvironmentStore, GroupStore, ServiceStore};

/// Drives deployments and scaling operations toward their desired state
///
/// The monitor owns the cluster handler cache and must be driven from a
/// single task; [`MonitorHandle`](scheduler::MonitorHandle) runs it at a
/// fixed delay. [`run_cycle`](RolloutMonitor::run_cycle) can also be invoked
/// directly for a one-shot diagnostic pass.
pub struct RolloutMonitor {
    deployments: Arc<dyn DeploymentStore>,
    environments: Arc<dyn EnvironmentStore>,
    groups: Arc<dyn GroupStore>,
    services: Arc<dyn ServiceStore>,
    registry: Arc<dyn SlaveRegistry>,
    env_status: Arc<dyn EnvStatusManager>,
    handlers: HandlerCache,
    cycle: u64,
}

impl RolloutMonitor {
    /// Create a monitor over the given storage boundaries
    pub fn new(
        deployments: Arc<dyn DeploymentStore>,
        environments: Arc<dyn EnvironmentStore>,
        groups: Arc<dyn GroupStore>,
        services: Arc<dyn ServiceStore>,
        registry: Arc<dyn SlaveRegistry>,
        env_status: Arc<dyn EnvStatusManager>,
    ) -> Self {
        Self {
            deployments,
            environments,
            groups,
            services,
            registry,
            env_status,
            handlers: HandlerCache::new(),
            cycle: 0,
        }
    }

    /// Replace the built-in handler cache, e.g. to inject a custom factory
    pub fn with_handler_cache(mut self, handlers: HandlerCache) -> Self {
        self.handlers = handlers;
        self
    }

    /// Run one full reconciliation cycle
    ///
    /// Never fails: per-item faults are tallied on the report and the pass
    /// moves on; a fault that takes down a whole pass flips that pass's
    /// failed flag and the other pass still runs.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycle += 1;
        debug!("Reconciliation cycle {} starting", self.cycle);
        let mut report = CycleReport::default();

        if let Err(err) = self.registry.heartbeat().await {
            warn!("Failed to refresh slave keepalive: {}", err);
        }

        if let Err(err) = self.deployment_pass(&mut report).await {
            report.deployment_pass_failed = true;
            error!("Deployment pass failed, moving on: {}", err);
        }

        if let Err(err) = scaling::run_scaling_pass(
            self.groups.as_ref(),
            self.environments.as_ref(),
            self.services.as_ref(),
            &mut self.handlers,
            &mut report,
        )
        .await
        {
            report.scaling_pass_failed = true;
            error!("Scaling pass failed, moving on: {}", err);
        }

        debug!("Reconciliation cycle {} finished", self.cycle);
        report
    }

    /// Walk the deployment working set in ascending id order, skipping
    /// deployments outside this instance's scope
    async fn deployment_pass(&mut self, report: &mut CycleReport) -> Result<()> {
        let scope =
            scope::scoped_environments(self.registry.as_ref(), self.environments.as_ref()).await?;
        report.scoped_environments = scope.len();

        let mut working_set = self.deployments.list_running().await?;
        working_set.sort_by_key(|deployment| deployment.id);

        for deployment in working_set {
            report.deployments_seen += 1;

            if !scope.contains(&deployment.environment_id) {
                debug!(
                    "Deployment {} is of environment {} which is out of scope, skipping",
                    deployment.id, deployment.environment_id
                );
                report.deployments_skipped += 1;
                continue;
            }

            if let Err(err) = self.process_deployment(&deployment, report).await {
                report.deployments_failed += 1;
                warn!(
                    "Failed to process deployment {}, moving on: {}",
                    deployment.id, err
                );
            }
        }

        Ok(())
    }

    /// Drive one deployment a single step through the status state machine
    /// and persist the result
    async fn process_deployment(
        &mut self,
        deployment: &Deployment,
        report: &mut CycleReport,
    ) -> Result<()> {
        let environment = self.environments.get(deployment.environment_id).await?;
        let handler = self.handlers.get_or_create(&environment)?;

        let returned = match deployment.status {
            DeploymentStatus::Pending => {
                let allowed = limits::is_deploy_allowed(
                    deployment,
                    self.environments.as_ref(),
                    self.deployments.as_ref(),
                )
                .await?;
                if allowed {
                    let returned = handler.start_deployment(deployment).await?;
                    report.deployments_started += 1;
                    info!(
                        "Started deployment {} (service {}, version {}) in environment {}",
                        deployment.id,
                        deployment.service_id,
                        deployment.deployable_version,
                        environment.name
                    );
                    returned
                } else {
                    info!(
                        "Environment {} concurrency limit reached, not starting deployment {} until one is done",
                        deployment.environment_id, deployment.id
                    );
                    report.deployments_held += 1;
                    deployment.clone()
                }
            }
            DeploymentStatus::PendingCancellation => {
                let returned = handler.cancel_deployment(deployment).await?;
                report.deployments_canceled += 1;
                info!("Requested cancellation of deployment {}", deployment.id);
                returned
            }
            _ => {
                let returned = handler.monitor_deployment(deployment).await?;
                report.deployments_monitored += 1;
                returned
            }
        };

        if returned.status != deployment.status {
            info!(
                "Deployment {} moved from {} to {}",
                deployment.id, deployment.status, returned.status
            );
        }
        self.deployments
            .update_status(deployment.id, returned.status)
            .await?;

        // The snapshot keys off the status persisted before this cycle's
        // handler call. A deployment that went terminal just now is
        // snapshotted on the next cycle, which is also when it leaves the
        // working set.
        if deployment.status.is_terminal() {
            let snapshot = self
                .env_status
                .current_status(deployment, handler.as_ref())
                .await?;
            self.env_status.record_status(deployment, snapshot).await?;
            report.snapshots_recorded += 1;
        }

        Ok(())
    }
}
