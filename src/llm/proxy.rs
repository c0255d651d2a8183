//! Proxy transport — JSON POST to a backend that talks to the AI provider.
//!
//! This is the reference path: the backend owns the provider API key and
//! the prompt, the client only ships photos + questionnaire. The response
//! status and body are passed through untouched for classification.

use super::transport::{AnalysisRequest, AnalysisTransport, RemoteResponse, TransportError};
use async_trait::async_trait;

pub struct ProxyTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl ProxyTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisTransport for ProxyTransport {
    fn name(&self) -> &str {
        "proxy"
    }

    async fn submit(&self, request: &AnalysisRequest) -> Result<RemoteResponse, TransportError> {
        let start = std::time::Instant::now();
        log::info!(
            "[REMOTE] POST {} ({} photo(s))",
            self.endpoint,
            request.photos.len()
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                log::error!("[REMOTE] HTTP request failed: {}", e);
                TransportError::Request(e.to_string())
            })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            log::error!("[REMOTE] Failed to read response body: {}", e);
            TransportError::Body(e.to_string())
        })?;

        log::info!(
            "[REMOTE] {} → {} ({} bytes) in {}ms",
            self.endpoint,
            status,
            body.len(),
            start.elapsed().as_millis()
        );
        if !(200..300).contains(&status) {
            log::warn!("[REMOTE] Error body: {}", super::preview(&body, 200));
        }

        Ok(RemoteResponse { status, body })
    }
}
