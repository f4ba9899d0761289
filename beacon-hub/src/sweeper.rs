//! Background eviction of stale records and idle rooms.
//!
//! One sweeper task per hub. The eviction logic itself lives in
//! [`PresenceStore::sweep`] so tests can drive it deterministically; the
//! task here only supplies the cadence and a clean shutdown path.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use beacon_core::now_ms;

use crate::store::PresenceStore;

/// Handle to a running sweeper task.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the task to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }

    /// Abort the task without waiting.
    pub fn abort(&self) {
        self.task.abort();
    }
}

/// Spawn the eviction loop, ticking every `sweep_interval` from the
/// store's config.
pub fn spawn(store: Arc<PresenceStore>) -> SweeperHandle {
    let (tx, mut rx) = watch::channel(false);
    let interval = store.config().sweep_interval;

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let stats = store.sweep(now_ms());

                    #[cfg(feature = "tracing")]
                    if stats.records_evicted > 0 || stats.rooms_removed > 0 {
                        tracing::debug!(
                            records = stats.records_evicted,
                            rooms = stats.rooms_removed,
                            "evicted stale presence"
                        );
                    }

                    #[cfg(not(feature = "tracing"))]
                    let _ = stats;
                }
                changed = rx.changed() => {
                    if changed.is_err() || *rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    SweeperHandle { shutdown: tx, task }
}
