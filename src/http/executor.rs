use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Request};
use tracing::{debug, warn};
use url::Url;

use crate::document::SignedDocument;
use crate::error::{AppError, Result};
use crate::http::pool::{create_http_client, HttpSettings};

/// Performs one outgoing call for an admitted unit of work.
///
/// Implementations own serialization, transport and response handling.
/// The admission layer calls `send` at most once per permit and never
/// looks at or retries the result.
#[async_trait]
pub trait CallExecutor<P: Send + Sync>: Send + Sync {
    type Outcome: Send;

    async fn send(&self, payload: &P) -> Result<Self::Outcome>;
}

/// Successful (non-error status) response from the registration API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

/// Posts signed documents as JSON to a single endpoint.
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Client,
    endpoint: Url,
}

impl HttpExecutor {
    pub fn new(endpoint: &str, settings: &HttpSettings) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        let client = create_http_client(settings)?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Serializes the document and assembles the POST without sending it.
    pub fn build_request(&self, payload: &SignedDocument) -> Result<Request> {
        let body = serde_json::to_vec(&payload.document)?;

        let request = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header("Signature", payload.signature.as_str())
            .body(body)
            .build()?;

        Ok(request)
    }
}

#[async_trait]
impl CallExecutor<SignedDocument> for HttpExecutor {
    type Outcome = ApiResponse;

    async fn send(&self, payload: &SignedDocument) -> Result<ApiResponse> {
        let request = self.build_request(payload)?;
        debug!("POST {} (doc_id={})", self.endpoint, payload.document.doc_id);

        let response = self.client.execute(request).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        if status >= 400 {
            warn!("Registration API returned {} for doc_id={}", status, payload.document.doc_id);
            return Err(AppError::Api { status, body });
        }

        Ok(ApiResponse { status, body })
    }
}
