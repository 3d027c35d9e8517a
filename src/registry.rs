//! Slave registration and environment ownership

use crate::error::Result;
use crate::models::{EnvironmentId, SlaveClaim};
use crate::store::SlaveStore;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

/// Ownership answers the scope resolver needs each cycle
#[async_trait]
pub trait SlaveRegistry: Send + Sync {
    /// Whether this instance runs as a slave
    async fn is_slave(&self) -> Result<bool>;

    /// Environment ids this instance claimed (slave role only)
    async fn owned_environment_ids(&self) -> Result<Vec<EnvironmentId>>;

    /// Environment ids owned by any slave with a fresh keepalive
    async fn all_valid_slaves_environment_ids(&self) -> Result<Vec<EnvironmentId>>;

    /// Refresh this instance's claims; no-op for a master
    async fn heartbeat(&self) -> Result<()>;
}

/// Slave registry backed by claim storage
///
/// A slave registers its configured environments under its instance name and
/// keeps them alive via `heartbeat`. A claim counts as valid while its
/// keepalive is younger than the window, so a dead slave's environments fall
/// back to master coverage once the window elapses.
pub struct StoreSlaveRegistry {
    store: Arc<dyn SlaveStore>,
    instance: String,
    owned: Vec<EnvironmentId>,
    keepalive_window: Duration,
}

impl StoreSlaveRegistry {
    /// Register this instance and return the registry
    ///
    /// Clears any claims left over from a previous incarnation of the same
    /// instance, then claims `owned` (empty for a master).
    pub async fn register(
        store: Arc<dyn SlaveStore>,
        instance: &str,
        owned: Vec<EnvironmentId>,
        keepalive_window: Duration,
    ) -> Result<Self> {
        let owned: Vec<EnvironmentId> = owned
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        store.remove_instance_claims(instance).await?;
        for environment_id in &owned {
            store
                .put_claim(SlaveClaim::new(instance, *environment_id))
                .await?;
        }

        if owned.is_empty() {
            info!("Instance {} registered as master", instance);
        } else {
            info!(
                "Instance {} registered as slave for environments {:?}",
                instance, owned
            );
        }

        Ok(Self {
            store,
            instance: instance.to_string(),
            owned,
            keepalive_window,
        })
    }
}

#[async_trait]
impl SlaveRegistry for StoreSlaveRegistry {
    async fn is_slave(&self) -> Result<bool> {
        Ok(!self.owned.is_empty())
    }

    async fn owned_environment_ids(&self) -> Result<Vec<EnvironmentId>> {
        Ok(self.owned.clone())
    }

    async fn all_valid_slaves_environment_ids(&self) -> Result<Vec<EnvironmentId>> {
        let now = Utc::now();
        let claims = self.store.list_claims().await?;
        let valid: BTreeSet<EnvironmentId> = claims
            .iter()
            .filter(|claim| claim.is_valid(self.keepalive_window, now))
            .map(|claim| claim.environment_id)
            .collect();
        Ok(valid.into_iter().collect())
    }

    async fn heartbeat(&self) -> Result<()> {
        if self.owned.is_empty() {
            return Ok(());
        }
        self.store
            .refresh_keepalive(&self.instance, Utc::now())
            .await
    }
}
