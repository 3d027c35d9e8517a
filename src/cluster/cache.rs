//! Per-environment cluster handler cache

use super::rest::{Dialect, RestClusterHandler};
use super::ClusterHandler;
use crate::error::Result;
use crate::models::{ClusterBackend, Environment, EnvironmentId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Constructs a handler for an environment
pub type HandlerFactory =
    Box<dyn Fn(&Environment) -> anyhow::Result<Arc<dyn ClusterHandler>> + Send + Sync>;

/// Lazily constructed, process-lifetime cache of cluster handlers
///
/// Confined to the monitor's worker task; a handler is built once per
/// environment and reused by every later cycle.
pub struct HandlerCache {
    factory: HandlerFactory,
    handlers: HashMap<EnvironmentId, Arc<dyn ClusterHandler>>,
}

impl HandlerCache {
    /// Create a cache backed by the built-in handler variants
    pub fn new() -> Self {
        Self::with_factory(Box::new(build_handler))
    }

    /// Create a cache with a custom handler factory
    pub fn with_factory(factory: HandlerFactory) -> Self {
        Self {
            factory,
            handlers: HashMap::new(),
        }
    }

    /// Return the environment's handler, constructing it on first use
    ///
    /// Construction failures propagate to the caller and nothing is cached,
    /// so the next lookup retries.
    pub fn get_or_create(&mut self, environment: &Environment) -> Result<Arc<dyn ClusterHandler>> {
        if let Some(handler) = self.handlers.get(&environment.id) {
            return Ok(handler.clone());
        }

        let handler = (self.factory)(environment)?;
        info!(
            "Created {:?} cluster handler for environment {} ({})",
            environment.backend, environment.id, environment.name
        );
        self.handlers.insert(environment.id, handler.clone());
        Ok(handler)
    }

    /// Number of cached handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Select and construct the handler variant for an environment's backend
fn build_handler(environment: &Environment) -> anyhow::Result<Arc<dyn ClusterHandler>> {
    let handler = match environment.backend {
        ClusterBackend::RestV1 => RestClusterHandler::new(environment, Dialect::V1)?,
        ClusterBackend::RestV2 => RestClusterHandler::new(environment, Dialect::V2)?,
    };
    Ok(Arc::new(handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ScaleOutcome;
    use crate::models::{Deployment, Service};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct NullHandler;

    #[async_trait]
    impl ClusterHandler for NullHandler {
        async fn start_deployment(&self, deployment: &Deployment) -> anyhow::Result<Deployment> {
            Ok(deployment.clone())
        }

        async fn cancel_deployment(&self, deployment: &Deployment) -> anyhow::Result<Deployment> {
            Ok(deployment.clone())
        }

        async fn monitor_deployment(&self, deployment: &Deployment) -> anyhow::Result<Deployment> {
            Ok(deployment.clone())
        }

        async fn set_scaling_factor(
            &self,
            _service: &Service,
            _group_name: &str,
            _factor: u32,
        ) -> anyhow::Result<ScaleOutcome> {
            Ok(ScaleOutcome::Applied)
        }
    }

    fn counting_cache() -> (HandlerCache, Arc<AtomicUsize>) {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let cache = HandlerCache::with_factory(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NullHandler))
        }));
        (cache, built)
    }

    #[test]
    fn test_handler_built_once_per_environment() {
        let (mut cache, built) = counting_cache();
        let env = Environment::new(1, "staging", "http://cluster.local");

        let first = cache.get_or_create(&env).unwrap();
        let second = cache.get_or_create(&env).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_handlers_keyed_by_environment() {
        let (mut cache, built) = counting_cache();

        cache
            .get_or_create(&Environment::new(1, "staging", "http://a.local"))
            .unwrap();
        cache
            .get_or_create(&Environment::new(2, "prod", "http://b.local"))
            .unwrap();

        assert_eq!(built.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_construction_failure_not_cached() {
        let mut cache = HandlerCache::with_factory(Box::new(|_| Err(anyhow!("no backend"))));
        let env = Environment::new(1, "staging", "http://cluster.local");

        assert!(cache.get_or_create(&env).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_builtin_factory_selects_backend_variant() {
        let mut cache = HandlerCache::new();
        let env = Environment::new(1, "staging", "http://cluster.local");

        assert!(cache.get_or_create(&env).is_ok());
        assert_eq!(cache.len(), 1);
    }
}
