//! Monitor configuration
//!
//! Loaded from a YAML file; every section is optional and falls back to
//! defaults. Fixtures seed the in-memory store so a single binary can run
//! against a known world without a database.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CapstanError, Result};
use crate::models::{Deployment, Environment, EnvironmentId, Group, Service};
use crate::store::MemoryStore;

/// Environment variable overriding `monitor.local_run`
pub const LOCAL_RUN_ENV: &str = "CAPSTAN_LOCAL_RUN";

/// Config file name under the user config directory
pub const DEFAULT_CONFIG_FILE: &str = "capstan.yaml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Reconciliation loop settings
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Slave role settings; absent means this instance is the master
    #[serde(default)]
    pub slave: Option<SlaveConfig>,
    /// Seed data for the in-memory store
    #[serde(default)]
    pub fixtures: Fixtures,
}

/// Reconciliation loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Seconds between the end of one cycle and the start of the next
    #[serde(default = "default_cadence_secs")]
    pub cadence_secs: u64,
    /// Seconds to wait for an in-flight cycle on shutdown before aborting it
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,
    /// Disable the scheduler entirely for local/offline execution
    #[serde(default)]
    pub local_run: bool,
    /// Seconds a slave claim stays valid without a keepalive refresh
    #[serde(default = "default_keepalive_window_secs")]
    pub keepalive_window_secs: i64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cadence_secs: default_cadence_secs(),
            stop_timeout_secs: default_stop_timeout_secs(),
            local_run: false,
            keepalive_window_secs: default_keepalive_window_secs(),
        }
    }
}

fn default_cadence_secs() -> u64 {
    30
}

fn default_stop_timeout_secs() -> u64 {
    60
}

fn default_keepalive_window_secs() -> i64 {
    90
}

/// Slave role settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlaveConfig {
    /// Environment ids this instance owns
    #[serde(default)]
    pub environment_ids: Vec<EnvironmentId>,
}

/// Seed data loaded into the in-memory store at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    /// Environments to register
    #[serde(default)]
    pub environments: Vec<Environment>,
    /// Services to register
    #[serde(default)]
    pub services: Vec<Service>,
    /// Deployments to register
    #[serde(default)]
    pub deployments: Vec<Deployment>,
    /// Groups to register
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Fixtures {
    /// Load all fixture records into the store
    pub fn seed(&self, store: &MemoryStore) -> Result<()> {
        for environment in &self.environments {
            store.add_environment(environment.clone())?;
        }
        for service in &self.services {
            store.add_service(service.clone())?;
        }
        for deployment in &self.deployments {
            store.add_deployment(deployment.clone())?;
        }
        for group in &self.groups {
            store.add_group(group.clone())?;
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content).map_err(|e| {
            CapstanError::Yaml(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.apply_local_run_override(std::env::var(LOCAL_RUN_ENV).ok().as_deref());
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, or from the default location, falling
    /// back to defaults when no file exists
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            let mut config = Self::default();
            config.apply_local_run_override(std::env::var(LOCAL_RUN_ENV).ok().as_deref());
            Ok(config)
        }
    }

    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/etc"))
            .join("capstan")
            .join(DEFAULT_CONFIG_FILE)
    }

    /// Environment ids this instance claims; empty for a master
    pub fn owned_environment_ids(&self) -> Vec<EnvironmentId> {
        self.slave
            .as_ref()
            .map(|slave| slave.environment_ids.clone())
            .unwrap_or_default()
    }

    fn apply_local_run_override(&mut self, value: Option<&str>) {
        if let Some(value) = value {
            let value = value.trim();
            self.monitor.local_run = value == "1" || value.eq_ignore_ascii_case("true");
        }
    }

    fn validate(&self) -> Result<()> {
        if self.monitor.cadence_secs == 0 {
            return Err(CapstanError::InvalidConfig(
                "monitor.cadence_secs must be at least 1".to_string(),
            ));
        }
        if self.monitor.keepalive_window_secs <= 0 {
            return Err(CapstanError::InvalidConfig(
                "monitor.keepalive_window_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use crate::models::{DeploymentStatus, ScalingStatus};

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.monitor.cadence_secs, 30);
        assert_eq!(config.monitor.stop_timeout_secs, 60);
        assert_eq!(config.monitor.keepalive_window_secs, 90);
        assert!(!config.monitor.local_run);
        assert!(config.slave.is_none());
        assert!(config.owned_environment_ids().is_empty());
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
monitor:
  cadence_secs: 10
  stop_timeout_secs: 20
  local_run: true
  keepalive_window_secs: 45
slave:
  environment_ids: [5, 7]
fixtures:
  environments:
    - id: 5
      name: staging
      cluster_url: https://staging.internal
      backend: rest_v2
      concurrency_limit: 2
  services:
    - id: 100
      name: billing
  deployments:
    - id: 1
      environment_id: 5
      service_id: 100
      deployable_version: v1.4.0
  groups:
    - id: 1
      name: workers
      service_id: 100
      environment_id: 5
      scaling_factor: 3
"#,
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.monitor.cadence_secs, 10);
        assert_eq!(config.monitor.stop_timeout_secs, 20);
        assert_eq!(config.monitor.keepalive_window_secs, 45);
        assert_eq!(config.owned_environment_ids(), vec![5, 7]);
        assert_eq!(config.fixtures.environments.len(), 1);
        assert_eq!(config.fixtures.environments[0].concurrency_limit, Some(2));
        assert_eq!(config.fixtures.deployments[0].status, DeploymentStatus::Pending);
        assert_eq!(
            config.fixtures.groups[0].scaling_status,
            ScalingStatus::Pending
        );
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let file = write_config("monitor:\n  cadence_secs: 5\n");

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.monitor.cadence_secs, 5);
        assert_eq!(config.monitor.stop_timeout_secs, 60);
        assert!(config.slave.is_none());
        assert!(config.fixtures.deployments.is_empty());
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        let file = write_config("monitor: [");

        let result = Config::load(file.path());
        assert!(matches!(result, Err(CapstanError::Yaml(_))));
    }

    #[test]
    fn test_zero_cadence_rejected() {
        let file = write_config("monitor:\n  cadence_secs: 0\n");

        let result = Config::load(file.path());
        assert!(matches!(result, Err(CapstanError::InvalidConfig(_))));
    }

    #[test]
    fn test_local_run_override() {
        let mut config = Config::default();
        config.apply_local_run_override(Some("true"));
        assert!(config.monitor.local_run);

        config.apply_local_run_override(Some("FALSE"));
        assert!(!config.monitor.local_run);

        config.apply_local_run_override(Some("1"));
        assert!(config.monitor.local_run);

        config.apply_local_run_override(Some("0"));
        assert!(!config.monitor.local_run);

        let mut config = Config::default();
        config.monitor.local_run = true;
        config.apply_local_run_override(None);
        assert!(config.monitor.local_run);
    }

    #[test]
    fn test_fixtures_seed_store() {
        let file = write_config(
            r#"
fixtures:
  environments:
    - id: 1
      name: production
      cluster_url: https://cluster.internal
  services:
    - id: 100
      name: billing
  deployments:
    - id: 1
      environment_id: 1
      service_id: 100
      deployable_version: v2.0.1
      status: started
"#,
        );
        let config = Config::load(file.path()).unwrap();
        let store = MemoryStore::new();

        config.fixtures.seed(&store).unwrap();

        let deployment = store.get_deployment(1).unwrap().unwrap();
        assert_eq!(deployment.status, DeploymentStatus::Started);
        assert_eq!(deployment.deployable_version, "v2.0.1");
    }
}
