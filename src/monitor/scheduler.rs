//! Fixed-delay reconciliation scheduler

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::RolloutMonitor;
use crate::config::MonitorConfig;

/// Handle owning the background reconciliation worker
///
/// Dropping the handle without calling [`stop`](MonitorHandle::stop) signals
/// the worker to exit at its next checkpoint.
pub struct MonitorHandle {
    worker: Option<Worker>,
    stop_timeout: Duration,
}

struct Worker {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Start the reconciliation loop
    ///
    /// The first cycle runs immediately; each subsequent cycle starts one
    /// cadence after the previous cycle *finished*, so a slow cycle pushes
    /// the next one out instead of overlapping it. With `local_run` set, no
    /// worker is spawned and `stop` is a no-op.
    pub fn start(monitor: RolloutMonitor, config: &MonitorConfig) -> Self {
        let stop_timeout = Duration::from_secs(config.stop_timeout_secs);

        if config.local_run {
            info!("Running in local mode, reconciliation worker is not up");
            return Self {
                worker: None,
                stop_timeout,
            };
        }

        info!(
            "Starting reconciliation worker, cadence {}s",
            config.cadence_secs
        );
        let cadence = Duration::from_secs(config.cadence_secs);
        let (shutdown, signal) = watch::channel(false);
        let task = tokio::spawn(run_loop(monitor, cadence, signal));

        Self {
            worker: Some(Worker { shutdown, task }),
            stop_timeout,
        }
    }

    /// Whether a background worker was spawned
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Stop the worker, waiting up to the configured timeout for an
    /// in-flight cycle to finish naturally
    ///
    /// Returns false if the worker had to be aborted. Partial persistence
    /// from an aborted cycle is recomputed from durable state on the next
    /// start, so nothing is rolled back.
    pub async fn stop(self) -> bool {
        let Some(Worker { shutdown, mut task }) = self.worker else {
            return true;
        };

        info!("Stopping reconciliation worker");
        let _ = shutdown.send(true);

        match tokio::time::timeout(self.stop_timeout, &mut task).await {
            Ok(Ok(())) => {
                info!("Reconciliation worker stopped");
                true
            }
            Ok(Err(err)) => {
                error!("Reconciliation worker failed while stopping: {}", err);
                true
            }
            Err(_) => {
                error!(
                    "In-flight cycle did not finish within {}s, aborting worker",
                    self.stop_timeout.as_secs()
                );
                task.abort();
                false
            }
        }
    }
}

async fn run_loop(
    mut monitor: RolloutMonitor,
    cadence: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let report = monitor.run_cycle().await;
        if report.had_failures() {
            warn!("Reconciliation cycle finished with failures: {:?}", report);
        } else {
            debug!("Reconciliation cycle finished: {:?}", report);
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(cadence) => {}
        }
    }
    debug!("Reconciliation worker exiting");
}
