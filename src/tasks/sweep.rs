//! Stale Sweep Task
//!
//! Background task that periodically drops entries that are no longer fresh.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::executor::SharedStore;

/// Spawns a background task that sweeps stale entries every
/// `interval_secs` seconds.
///
/// Returns `None` when `interval_secs` is 0; the cache then grows without
/// bound. Abort the returned handle during shutdown.
pub fn spawn_sweep_task(store: SharedStore, interval_secs: u64) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        info!("Stale sweep disabled");
        return None;
    }

    let interval = Duration::from_secs(interval_secs);

    Some(tokio::spawn(async move {
        info!(
            "Starting stale sweep task with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.write().await.sweep_stale();

            if removed > 0 {
                info!("Stale sweep: removed {} entries", removed);
            } else {
                debug!("Stale sweep: no stale entries found");
            }
        }
    }))
}
