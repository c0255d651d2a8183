//! Outbound port — one call to the remote analysis service per attempt.
//!
//! Transports only move bytes. They never retry and never classify: a
//! non-2xx status is still `Ok(RemoteResponse)`, and only failures where
//! no status exists (DNS, connect, reset, unreadable body) are `Err`.
//! The orchestrator decides what each outcome means.

use super::types::{QuestionnaireData, QuestionnairePayload};
use crate::capture::{PhotoSlot, PreparedPhoto};
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// One photo as it appears in the request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhotoPayload {
    pub angle: PhotoSlot,
    /// `data:image/jpeg;base64,...`
    pub image: String,
}

/// JSON body submitted on every attempt of one `analyze` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub photos: Vec<PhotoPayload>,
    pub questionnaire: QuestionnairePayload,
}

impl AnalysisRequest {
    pub fn new(photos: &[PreparedPhoto], questionnaire: &QuestionnaireData) -> Self {
        Self {
            photos: photos
                .iter()
                .map(|p| PhotoPayload {
                    angle: p.slot,
                    image: p.image.to_data_url(),
                })
                .collect(),
            questionnaire: questionnaire.normalized(),
        }
    }
}

/// What came back from the remote: status code and raw body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

impl RemoteResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure — no usable HTTP status.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("transport not configured: {0}")]
    Config(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError::Request(e.to_string())
    }
}

#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    /// Short name for logs ("proxy", "gemini", ...).
    fn name(&self) -> &str;

    async fn submit(&self, request: &AnalysisRequest) -> Result<RemoteResponse, TransportError>;
}
