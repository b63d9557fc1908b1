//! Periodic sync loop.
//!
//! Runs sync cycles on a fixed interval while the daemon is active. Ticks
//! are strictly serial — each cycle runs to completion before the next tick
//! is taken — which is what keeps dataset mutation safe without a lock
//! around the store.

use crate::sync::SyncCoordinator;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;

/// Spawn the periodic sync loop until daemon shutdown is signaled.
pub fn spawn(
    coordinator: Arc<SyncCoordinator>,
    interval: Duration,
    shutdown: Arc<Notify>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("sync scheduler started: interval={}s", interval.as_secs());
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; the caller already ran the
        // install-time sync, so skip it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    tracing::info!("sync scheduler stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match coordinator.sync().await {
                        Ok(report) => tracing::debug!("scheduled sync finished: {report:?}"),
                        Err(e) => tracing::warn!("scheduled sync failed: {e:#}"),
                    }
                }
            }
        }
    })
}
