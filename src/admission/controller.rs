use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

use crate::admission::limit::RateLimit;
use crate::admission::pool::PermitPool;
use crate::admission::replenisher::Replenisher;
use crate::error::AdmissionError;

/// Gates outgoing calls to at most `capacity` per `window`.
///
/// Permits are consumed for good on admission. The background replenisher
/// puts them back one every `window / capacity`, never past `capacity`.
/// Share it between callers with `Arc`.
pub struct AdmissionController {
    pool: Arc<PermitPool>,
    limit: RateLimit,
    // std Mutex: only held to take the Option, never across an await
    replenisher: Mutex<Option<Replenisher>>,
}

impl AdmissionController {
    /// Creates a full pool and starts replenishing it.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn new(limit: RateLimit) -> Self {
        let pool = Arc::new(PermitPool::new(limit.capacity() as usize));
        let replenisher = Replenisher::spawn(pool.clone(), limit);

        info!(
            "Admission controller started: {} calls per {:?}",
            limit.capacity(),
            limit.window()
        );

        Self {
            pool,
            limit,
            replenisher: Mutex::new(Some(replenisher)),
        }
    }

    /// Validates `window` and `capacity` before building the controller.
    /// Nothing is spawned when validation fails.
    pub fn try_new(window: Duration, capacity: i64) -> Result<Self, AdmissionError> {
        let limit = RateLimit::new(window, capacity)?;
        Ok(Self::new(limit))
    }

    /// Waits until a permit is available and consumes it.
    ///
    /// Dropping the returned future while it waits leaves the pool as it
    /// was, even if a tick already woke it.
    pub async fn acquire(&self) -> Result<(), AdmissionError> {
        self.pool.take().await
    }

    /// Like [`acquire`](Self::acquire), giving up after `wait`.
    pub async fn acquire_timeout(&self, wait: Duration) -> Result<(), AdmissionError> {
        match tokio::time::timeout(wait, self.acquire()).await {
            Ok(result) => result,
            Err(_) => {
                debug!("No permit within {:?}", wait);
                Err(AdmissionError::AdmissionTimeout(wait))
            }
        }
    }

    /// Like [`acquire`](Self::acquire), abandoning the wait once `cancel`
    /// completes. A permit that is already available wins over the cancel.
    pub async fn acquire_or_cancel<F>(&self, cancel: F) -> Result<(), AdmissionError>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            result = self.acquire() => result,
            _ = cancel => {
                debug!("Permit wait interrupted");
                Err(AdmissionError::Interrupted)
            }
        }
    }

    /// Consumes a permit if one is available right now.
    pub fn try_acquire(&self) -> bool {
        matches!(self.pool.try_take(), Ok(true))
    }

    /// Admits one call and runs `send` for it.
    ///
    /// `send` runs at most once and only after admission; its result is
    /// handed back untouched.
    pub async fn submit<F, Fut, T, E>(&self, send: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<AdmissionError>,
    {
        self.acquire().await?;
        send().await
    }

    pub fn available_permits(&self) -> usize {
        self.pool.available()
    }

    pub fn capacity(&self) -> u32 {
        self.limit.capacity()
    }

    pub fn window(&self) -> Duration {
        self.limit.window()
    }

    pub fn tick(&self) -> Duration {
        self.limit.tick()
    }

    pub fn is_replenishing(&self) -> bool {
        let guard = self.replenisher.lock().unwrap_or_else(|e| e.into_inner());
        guard.as_ref().map_or(false, |r| !r.is_finished())
    }

    /// Stops replenishment and closes the pool.
    ///
    /// Waiting and future callers get [`AdmissionError::Shutdown`]. Returns
    /// once the background task has exited. Calling it again is a no-op.
    pub async fn shutdown(&self) {
        self.pool.close();
        let replenisher = self.take_replenisher();
        if let Some(replenisher) = replenisher {
            replenisher.stop().await;
            info!("Admission controller shut down.");
        }
    }

    fn take_replenisher(&self) -> Option<Replenisher> {
        self.replenisher
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

impl Drop for AdmissionController {
    fn drop(&mut self) {
        self.pool.close();
        if let Some(replenisher) = self.take_replenisher() {
            replenisher.abort();
        }
    }
}

impl std::fmt::Debug for AdmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionController")
            .field("capacity", &self.limit.capacity())
            .field("window", &self.limit.window())
            .field("available", &self.available_permits())
            .finish()
    }
}
