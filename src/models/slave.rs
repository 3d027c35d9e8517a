//! Slave ownership claims over environments

use super::EnvironmentId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A monitor instance's ownership claim over one environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaveClaim {
    /// Name of the claiming monitor instance
    pub instance: String,
    /// Claimed environment
    pub environment_id: EnvironmentId,
    /// Last keepalive refresh
    pub last_keepalive: DateTime<Utc>,
}

impl SlaveClaim {
    /// Create a claim with a fresh keepalive
    pub fn new(instance: &str, environment_id: EnvironmentId) -> Self {
        Self {
            instance: instance.to_string(),
            environment_id,
            last_keepalive: Utc::now(),
        }
    }

    /// Check if the claim's keepalive is fresher than the validity window
    pub fn is_valid(&self, window: Duration, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.last_keepalive) <= window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_claim_is_valid() {
        let claim = SlaveClaim::new("monitor-a", 5);
        assert!(claim.is_valid(Duration::seconds(90), Utc::now()));
    }

    #[test]
    fn test_stale_claim_is_invalid() {
        let mut claim = SlaveClaim::new("monitor-a", 5);
        claim.last_keepalive = Utc::now() - Duration::seconds(120);
        assert!(!claim.is_valid(Duration::seconds(90), Utc::now()));
    }
}
