use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::admission::{AdmissionController, RateLimit};
use crate::analytics::stats::ClientStats;
use crate::config::Config;
use crate::document::{Document, Signature, SignedDocument};
use crate::error::{AdmissionError, Result};
use crate::http::{CallExecutor, HttpExecutor};

/// Rate-limited client for the document registration API.
///
/// Every call takes one permit from a shared [`AdmissionController`] before
/// the executor runs. Wrap it in an `Arc` to share it between tasks.
pub struct CrptClient<E = HttpExecutor> {
    controller: AdmissionController,
    executor: E,
    stats: Arc<ClientStats>,
    admission_timeout: Option<Duration>,
}

impl CrptClient<HttpExecutor> {
    pub fn new(config: &Config) -> Result<Self> {
        let limit = config.rate_limit()?;
        let executor = HttpExecutor::new(&config.api_url, &config.http_settings())?;

        info!("Registration endpoint: {}", executor.endpoint());

        Ok(Self::with_executor(limit, executor).with_admission_timeout(config.admission_timeout()))
    }
}

impl<E> CrptClient<E>
where
    E: CallExecutor<SignedDocument>,
{
    pub fn with_executor(limit: RateLimit, executor: E) -> Self {
        Self {
            controller: AdmissionController::new(limit),
            executor,
            stats: Arc::new(ClientStats::new()),
            admission_timeout: None,
        }
    }

    /// Bound the wait for a permit; `None` waits indefinitely.
    pub fn with_admission_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.admission_timeout = timeout;
        self
    }

    /// Waits for admission, then submits the signed document once.
    ///
    /// Executor errors are returned as produced; nothing is retried.
    pub async fn create_document(&self, document: Document, signature: Signature) -> Result<E::Outcome> {
        let payload = SignedDocument::new(document, signature);
        self.admit().await?;
        self.send(&payload).await
    }

    /// Like [`create_document`](Self::create_document), but gives up the
    /// permit wait with [`AdmissionError::Interrupted`] once `cancel` completes.
    pub async fn create_document_or_cancel<F>(
        &self,
        document: Document,
        signature: Signature,
        cancel: F,
    ) -> Result<E::Outcome>
    where
        F: Future,
    {
        let payload = SignedDocument::new(document, signature);
        let start = Instant::now();
        let admitted = self.controller.acquire_or_cancel(cancel).await;
        self.record_admission(start, &admitted);
        admitted?;
        self.send(&payload).await
    }

    async fn admit(&self) -> Result<()> {
        let start = Instant::now();
        let admitted = match self.admission_timeout {
            Some(wait) => self.controller.acquire_timeout(wait).await,
            None => self.controller.acquire().await,
        };
        self.record_admission(start, &admitted);
        Ok(admitted?)
    }

    fn record_admission(&self, start: Instant, admitted: &std::result::Result<(), AdmissionError>) {
        match admitted {
            Ok(()) => {
                let waited = start.elapsed();
                self.stats.inc_admitted();
                self.stats
                    .update_admission_wait(u64::try_from(waited.as_millis()).unwrap_or(u64::MAX));
                debug!("Admitted after {:?}", waited);
            }
            Err(AdmissionError::AdmissionTimeout(wait)) => {
                self.stats.inc_admission_timeouts();
                warn!("Gave up waiting for rate limit after {:?}", wait);
            }
            Err(AdmissionError::Interrupted) => {
                self.stats.inc_interrupted();
                warn!("Interrupted while waiting for rate limit");
            }
            Err(e) => warn!("Admission refused: {}", e),
        }
    }

    async fn send(&self, payload: &SignedDocument) -> Result<E::Outcome> {
        match self.executor.send(payload).await {
            Ok(outcome) => {
                self.stats.inc_documents_sent();
                info!("Document {} submitted", payload.document.doc_id);
                Ok(outcome)
            }
            Err(e) => {
                self.stats.inc_documents_failed();
                warn!("Document {} failed: {}", payload.document.doc_id, e);
                Err(e)
            }
        }
    }

    pub fn controller(&self) -> &AdmissionController {
        &self.controller
    }

    pub fn stats(&self) -> Arc<ClientStats> {
        self.stats.clone()
    }

    pub async fn shutdown(&self) {
        self.stats.log_stats();
        self.controller.shutdown().await;
    }
}
