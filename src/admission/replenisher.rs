use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::admission::limit::RateLimit;
use crate::admission::pool::PermitPool;

/// Owned background task returning one permit per tick.
pub(crate) struct Replenisher {
    shutdown_tx: broadcast::Sender<()>,
    handle: JoinHandle<()>,
}

impl Replenisher {
    /// Spawns the refill loop on the current tokio runtime.
    ///
    /// The first tick fires one cadence after this call; the pool is
    /// expected to start full.
    pub(crate) fn spawn(pool: Arc<PermitPool>, limit: RateLimit) -> Self {
        let period = limit.tick();

        // Start is fixed here, not inside the task, so a late first poll
        // cannot shift the schedule.
        let mut ticker = interval_at(Instant::now() + period, period);
        // A late tick yields one permit, then the cadence restarts from there.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

        let handle = tokio::spawn(async move {
            debug!(
                "Replenisher started: 1 permit every {:?}, cap {}",
                period,
                limit.capacity()
            );
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        pool.replenish_one();
                    }
                    _ = shutdown_rx.recv() => {
                        break;
                    }
                }
            }
            debug!("Replenisher stopped.");
        });

        Self { shutdown_tx, handle }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signals the loop and waits for it to exit.
    pub(crate) async fn stop(self) {
        // Err only means the loop is already gone.
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.handle.await {
            warn!("Replenisher task ended abnormally: {}", e);
        }
    }

    pub(crate) fn abort(&self) {
        self.handle.abort();
    }
}
