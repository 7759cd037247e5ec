//! Epoch timer
//!
//! Closes one epoch per interval and hands the snapshot to the reporting
//! worker. The first rotation happens one full interval after start. Ticks
//! missed while the runtime was stalled are skipped, not replayed, so a slow
//! host never produces a burst of empty epochs.

use std::sync::Arc;
use std::time::Duration;

use pc_02_epoch_aggregation::{SensorDaemon, SnapshotQueue};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

pub struct EpochScheduler {
    daemon: Arc<SensorDaemon>,
    queue: SnapshotQueue,
    period: Duration,
}

impl EpochScheduler {
    pub fn new(daemon: Arc<SensorDaemon>, queue: SnapshotQueue, period: Duration) -> Self {
        Self {
            daemon,
            queue,
            period,
        }
    }

    /// Rotate epochs until `shutdown` flips to true or its sender is dropped
    ///
    /// Returns the number of epochs closed.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // Completes immediately
        ticker.tick().await;

        info!(interval_secs = self.period.as_secs(), "Epoch timer started");
        let mut rotated = 0u64;
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.wait_for(|stop| *stop) => {
                    info!(rotated, "Epoch timer stopped");
                    return rotated;
                }
            }

            let snapshot = self.daemon.rotate_epoch();
            rotated += 1;
            let epoch = snapshot.index;
            if self.queue.submit(snapshot) {
                debug!(epoch, "Snapshot queued for reporting");
            }
        }
    }
}
