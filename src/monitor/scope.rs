//! Environment scope resolution
//!
//! Decides which environments one monitor instance reconciles. A slave
//! instance works exactly the environments it registered for; the master
//! works everything else, so the two sides never overlap as long as slave
//! claims stay fresh.

use std::collections::HashSet;

use crate::error::Result;
use crate::models::EnvironmentId;
use crate::registry::SlaveRegistry;
use crate::store::EnvironmentStore;

/// Resolve the set of environment ids this instance reconciles
///
/// Slaves get their configured environments verbatim, whether or not those
/// environments currently exist. The master gets every known environment
/// minus the ones claimed by slaves with a fresh keepalive, so environments
/// behind an expired claim fall back to the master automatically.
pub async fn scoped_environments(
    registry: &dyn SlaveRegistry,
    environments: &dyn EnvironmentStore,
) -> Result<HashSet<EnvironmentId>> {
    if registry.is_slave().await? {
        return Ok(registry.owned_environment_ids().await?.into_iter().collect());
    }

    let claimed: HashSet<EnvironmentId> = registry
        .all_valid_slaves_environment_ids()
        .await?
        .into_iter()
        .collect();
    let scope = environments
        .list_all()
        .await?
        .into_iter()
        .map(|environment| environment.id)
        .filter(|id| !claimed.contains(id))
        .collect();
    Ok(scope)
}
