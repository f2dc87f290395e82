//! Scheduled sync - background task for periodic archive reconciliation.
//!
//! The HTTP trigger is optimal for operator-driven updates, but scheduled
//! sync keeps the archive converging even when nobody calls the endpoint:
//! new draws appear weekly upstream, so a missed trigger only delays, never
//! loses, data. Failed cycles are logged and retried on the next tick.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::sync::SyncService;
use crate::types::now_ms;
use log::{error, info};

/// Configuration for the scheduled sync task.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between sync runs
    pub sync_interval: Duration,
    /// Whether the scheduler is enabled
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            // Draws are published weekly; 6 hours keeps convergence prompt
            // without leaning on the upstream source
            sync_interval: Duration::from_secs(6 * 60 * 60),
            enabled: true,
        }
    }
}

/// Scheduler for periodic archive sync.
///
/// Runs as a background task spawned during server initialization.
pub struct SyncScheduler {
    service: Arc<SyncService>,
    config: SchedulerConfig,
    /// Timestamp of the last successful sync
    last_sync_at: Arc<RwLock<u64>>,
}

impl SyncScheduler {
    pub fn new(service: Arc<SyncService>, config: SchedulerConfig) -> Self {
        Self {
            service,
            config,
            last_sync_at: Arc::new(RwLock::new(now_ms())),
        }
    }

    /// Milliseconds since epoch of the last successful sync, or
    /// initialization time if none has completed yet.
    pub fn last_sync(&self) -> u64 {
        *self.last_sync_at.read()
    }

    /// Starts the scheduler loop.
    ///
    /// Runs indefinitely; spawn it as a tokio task. Returns immediately if
    /// the scheduler is disabled in config.
    pub async fn start(self: Arc<Self>) {
        if !self.config.enabled {
            info!("Scheduled sync is disabled, skipping");
            return;
        }

        info!(
            "Starting scheduled sync with {}-second interval",
            self.config.sync_interval.as_secs()
        );

        let mut ticker = interval(self.config.sync_interval);
        // The first tick fires immediately; skip it so startup and the
        // first scheduled run don't race the initial HTTP traffic.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            self.do_sync().await;
        }
    }

    /// Executes one sync cycle, logging the outcome without panicking.
    async fn do_sync(&self) {
        match self.service.sync().await {
            Ok(outcome) => {
                info!(
                    "Scheduled sync completed: {} added (latest={}) in {}ms",
                    outcome.added, outcome.latest, outcome.duration_ms
                );
                *self.last_sync_at.write() = now_ms();
            }
            Err(e) => {
                error!("Scheduled sync failed: {}", e);
            }
        }
    }
}
