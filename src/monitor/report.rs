//! Per-cycle outcome report

use serde::Serialize;

/// Tallies of everything one reconciliation cycle did
///
/// Per-item failures are counted rather than propagated; per-pass failures
/// (a listing query that could not run) flip the corresponding flag. The
/// scheduler logs the report, the diagnostic single-pass entry point returns
/// it to the caller.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    /// Environments this instance was responsible for
    pub scoped_environments: usize,
    /// Deployments in the working set
    pub deployments_seen: usize,
    /// Deployments outside the resolved scope, skipped untouched
    pub deployments_skipped: usize,
    /// Start delegations handed to the cluster
    pub deployments_started: usize,
    /// Pending deployments held back by a concurrency limit
    pub deployments_held: usize,
    /// Cancel delegations handed to the cluster
    pub deployments_canceled: usize,
    /// Status polls delegated to the cluster
    pub deployments_monitored: usize,
    /// Deployments whose processing failed this cycle
    pub deployments_failed: usize,
    /// Environment snapshots recorded onto finished deployments
    pub snapshots_recorded: usize,
    /// Scaling operations applied and marked done
    pub scaling_applied: usize,
    /// Scaling operations abandoned because the target is gone
    pub scaling_abandoned: usize,
    /// Scaling operations that failed and stay pending
    pub scaling_failed: usize,
    /// The deployment pass could not run at all
    pub deployment_pass_failed: bool,
    /// The scaling pass could not run at all
    pub scaling_pass_failed: bool,
}

impl CycleReport {
    /// Check if anything in the cycle failed
    pub fn had_failures(&self) -> bool {
        self.deployment_pass_failed
            || self.scaling_pass_failed
            || self.deployments_failed > 0
            || self.scaling_failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_report_has_no_failures() {
        let report = CycleReport::default();
        assert!(!report.had_failures());
    }

    #[test]
    fn test_item_and_pass_failures_detected() {
        let report = CycleReport {
            deployments_failed: 1,
            ..Default::default()
        };
        assert!(report.had_failures());

        let report = CycleReport {
            scaling_pass_failed: true,
            ..Default::default()
        };
        assert!(report.had_failures());
    }
}
