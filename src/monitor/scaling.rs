//! Scaling operation processing

use tracing::{info, warn};

use super::report::CycleReport;
use crate::cluster::{HandlerCache, ScaleOutcome};
use crate::error::Result;
use crate::models::{Group, ScalingStatus};
use crate::store::{EnvironmentStore, GroupStore, ServiceStore};

/// Apply every pending scaling operation, isolating failures per operation
///
/// A missing target finishes the operation just like success does: a
/// workload that no longer exists cannot be resized, and retrying it every
/// cycle forever would get nowhere. Any other failure leaves the operation
/// pending so the next cycle retries it.
pub(super) async fn run_scaling_pass(
    groups: &dyn GroupStore,
    environments: &dyn EnvironmentStore,
    services: &dyn ServiceStore,
    handlers: &mut HandlerCache,
    report: &mut CycleReport,
) -> Result<()> {
    for group in groups.list_running_scaling_operations().await? {
        match apply_operation(&group, groups, environments, services, handlers).await {
            Ok(ScaleOutcome::Applied) => {
                report.scaling_applied += 1;
                info!(
                    "Scaled group {} ({}) to factor {}",
                    group.id, group.name, group.scaling_factor
                );
            }
            Ok(ScaleOutcome::TargetMissing) => {
                report.scaling_abandoned += 1;
                warn!(
                    "Workload for group {} ({}) no longer exists, abandoning scaling operation",
                    group.id, group.name
                );
            }
            Err(err) => {
                report.scaling_failed += 1;
                warn!(
                    "Failed to scale group {} ({}), leaving pending: {}",
                    group.id, group.name, err
                );
            }
        }
    }

    Ok(())
}

/// Resolve one operation's environment, handler and service, apply the
/// factor, and persist the terminal scaling status
async fn apply_operation(
    group: &Group,
    groups: &dyn GroupStore,
    environments: &dyn EnvironmentStore,
    services: &dyn ServiceStore,
    handlers: &mut HandlerCache,
) -> Result<ScaleOutcome> {
    let environment = environments.get(group.environment_id).await?;
    let handler = handlers.get_or_create(&environment)?;
    let service = services.get(group.service_id).await?;

    let outcome = handler
        .set_scaling_factor(&service, &group.name, group.scaling_factor)
        .await?;
    groups
        .update_scaling_status(group.id, ScalingStatus::Done)
        .await?;
    Ok(outcome)
}
