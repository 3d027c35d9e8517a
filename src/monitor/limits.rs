//! Per-environment deployment concurrency limiting

use crate::error::Result;
use crate::models::Deployment;
use crate::store::{DeploymentStore, EnvironmentStore};

/// Smallest limit value that is enforced; anything below means unlimited
pub const MINIMUM_CONCURRENCY_LIMIT: u32 = 1;

/// Decide whether a pending deployment may start now
///
/// Emergency deployments always may. Otherwise the environment's limit is
/// read fresh and compared against the deployments currently holding a slot
/// in that environment. The count is a point-in-time read against storage,
/// not an in-cycle accumulator, so a cycle can admit one start the persisted
/// count does not reflect yet; the next cycle self-corrects.
pub async fn is_deploy_allowed(
    deployment: &Deployment,
    environments: &dyn EnvironmentStore,
    deployments: &dyn DeploymentStore,
) -> Result<bool> {
    if deployment.emergency {
        return Ok(true);
    }

    let environment = environments.get(deployment.environment_id).await?;
    let limit = match environment.concurrency_limit {
        Some(limit) if limit >= MINIMUM_CONCURRENCY_LIMIT => limit,
        _ => return Ok(true),
    };

    let ongoing = deployments
        .list_ongoing()
        .await?
        .into_iter()
        .filter(|ongoing| ongoing.environment_id == deployment.environment_id)
        .count() as u32;

    Ok(ongoing < limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::{DeploymentStatus, Environment};
    use crate::store::MemoryStore;

    fn store_with_limit(limit: Option<u32>) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let mut environment = Environment::new(1, "production", "https://cluster.internal");
        environment.concurrency_limit = limit;
        store.add_environment(environment).unwrap();
        store
    }

    fn started(id: i32, environment_id: i32) -> Deployment {
        Deployment::new(id, environment_id, 100 + id, "v1").with_status(DeploymentStatus::Started)
    }

    #[tokio::test]
    async fn test_limit_reached_blocks_pending() {
        let store = store_with_limit(Some(2));
        store.add_deployment(started(1, 1)).unwrap();
        store.add_deployment(started(2, 1)).unwrap();
        let pending = Deployment::new(3, 1, 103, "v1");

        let allowed = is_deploy_allowed(&pending, store.as_ref(), store.as_ref())
            .await
            .unwrap();
        assert!(!allowed);
    }

    #[tokio::test]
    async fn test_completed_deployment_frees_slot() {
        let store = store_with_limit(Some(2));
        store
            .add_deployment(started(1, 1).with_status(DeploymentStatus::Done))
            .unwrap();
        store.add_deployment(started(2, 1)).unwrap();
        let pending = Deployment::new(3, 1, 103, "v1");

        let allowed = is_deploy_allowed(&pending, store.as_ref(), store.as_ref())
            .await
            .unwrap();
        assert!(allowed);
    }

    #[tokio::test]
    async fn test_emergency_bypasses_limit() {
        let store = store_with_limit(Some(2));
        store.add_deployment(started(1, 1)).unwrap();
        store.add_deployment(started(2, 1)).unwrap();
        let emergency = Deployment::new(4, 1, 104, "v1").with_emergency(true);

        let allowed = is_deploy_allowed(&emergency, store.as_ref(), store.as_ref())
            .await
            .unwrap();
        assert!(allowed);
    }

    #[tokio::test]
    async fn test_no_limit_always_allows() {
        let store = store_with_limit(None);
        store.add_deployment(started(1, 1)).unwrap();
        store.add_deployment(started(2, 1)).unwrap();
        store.add_deployment(started(3, 1)).unwrap();
        let pending = Deployment::new(4, 1, 104, "v1");

        let allowed = is_deploy_allowed(&pending, store.as_ref(), store.as_ref())
            .await
            .unwrap();
        assert!(allowed);
    }

    #[tokio::test]
    async fn test_limit_below_minimum_is_ignored() {
        let store = store_with_limit(Some(0));
        store.add_deployment(started(1, 1)).unwrap();
        let pending = Deployment::new(2, 1, 102, "v1");

        let allowed = is_deploy_allowed(&pending, store.as_ref(), store.as_ref())
            .await
            .unwrap();
        assert!(allowed);
    }

    #[tokio::test]
    async fn test_other_environments_do_not_count() {
        let store = store_with_limit(Some(1));
        store
            .add_environment(Environment::new(2, "staging", "https://staging.internal"))
            .unwrap();
        store.add_deployment(started(1, 2)).unwrap();
        let pending = Deployment::new(2, 1, 102, "v1");

        let allowed = is_deploy_allowed(&pending, store.as_ref(), store.as_ref())
            .await
            .unwrap();
        assert!(allowed);
    }
}
