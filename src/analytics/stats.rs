use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

#[derive(Debug, Default)]
pub struct ClientStats {
    pub admitted: AtomicU64,
    pub admission_timeouts: AtomicU64,
    pub interrupted: AtomicU64,
    pub documents_sent: AtomicU64,
    pub documents_failed: AtomicU64,

    // Gauge: last observed time spent waiting for a permit
    pub last_admission_wait_ms: AtomicU64,
}

impl ClientStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_admission_timeouts(&self) {
        self.admission_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_interrupted(&self) {
        self.interrupted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_documents_sent(&self) {
        self.documents_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_documents_failed(&self) {
        self.documents_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_admission_wait(&self, ms: u64) {
        self.last_admission_wait_ms.store(ms, Ordering::Relaxed);
    }

    pub fn log_stats(&self) {
        let admitted = self.admitted.load(Ordering::Relaxed);
        let timeouts = self.admission_timeouts.load(Ordering::Relaxed);
        let interrupted = self.interrupted.load(Ordering::Relaxed);
        let sent = self.documents_sent.load(Ordering::Relaxed);
        let failed = self.documents_failed.load(Ordering::Relaxed);
        let wait = self.last_admission_wait_ms.load(Ordering::Relaxed);

        info!(
            "STATS: Admitted: {} (timeouts {}, interrupted {}) | Documents: {} sent, {} failed | Last wait {}ms",
            admitted, timeouts, interrupted, sent, failed, wait
        );
    }
}
