use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;

use crate::error::AdmissionError;

#[derive(Debug)]
struct PoolState {
    available: usize,
    closed: bool,
}

/// Counter of admission slots, bounded by `capacity`.
///
/// The count lives only behind the mutex. Waiters hold no share of it while
/// they sleep: a wake-up is a hint to re-check, and a permit moves out of
/// the pool only in [`try_take`](Self::try_take). A waiter dropped after
/// being woken therefore has nothing to hand back.
pub(crate) struct PermitPool {
    state: Mutex<PoolState>,
    notify: Notify,
    capacity: usize,
}

impl PermitPool {
    /// Starts full.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(PoolState {
                available: capacity,
                closed: false,
            }),
            notify: Notify::new(),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Takes one permit if there is one.
    pub(crate) fn try_take(&self) -> Result<bool, AdmissionError> {
        let mut state = self.lock();
        if state.closed {
            return Err(AdmissionError::Shutdown);
        }
        if state.available > 0 {
            state.available -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Sleeps until a permit can be taken, then takes it.
    pub(crate) async fn take(&self) -> Result<(), AdmissionError> {
        loop {
            // Register before checking so a tick between the check and the
            // await still wakes us.
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.try_take()? {
                return Ok(());
            }
            notified.await;
        }
    }

    /// Adds one permit unless the pool is full or closed, then wakes one
    /// waiter if anything is available. Returns whether a permit was added.
    ///
    /// The check and the increment happen under one lock, and nothing else
    /// ever increments, so the pool cannot exceed `capacity`.
    pub(crate) fn replenish_one(&self) -> bool {
        let (added, has_permits) = {
            let mut state = self.lock();
            if state.closed {
                return false;
            }
            let added = state.available < self.capacity;
            if added {
                state.available += 1;
            }
            (added, state.available > 0)
        };

        // Also sent on no-op ticks so a waiter never sleeps past a full pool.
        if has_permits {
            self.notify.notify_one();
        }
        added
    }

    /// Rejects current and future takers.
    pub(crate) fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub(crate) fn available(&self) -> usize {
        self.lock().available
    }
}

impl std::fmt::Debug for PermitPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("PermitPool")
            .field("available", &state.available)
            .field("capacity", &self.capacity)
            .field("closed", &state.closed)
            .finish()
    }
}
