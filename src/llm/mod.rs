//! Remote analysis domain — request/response types and transports.
//!
//! External code should only use the items exported here.
//!
//! Transports:
//!   - Proxy backend, JSON POST (proxy.rs) — reference path
//!   - Google Gemini Flash, direct (gemini.rs)
//!
//! Shared:
//!   - transport.rs — AnalysisTransport port + wire request/response
//!   - parse.rs     — fence stripping, result parsing, error/wait extraction
//!   - fallback.rs  — demo result when the remote cannot be used

pub mod fallback;
mod gemini;
pub mod parse;
pub mod prompts;
mod proxy;
pub mod transport;
pub mod types;

pub use fallback::fallback_result;
pub use gemini::GeminiTransport;
pub use proxy::ProxyTransport;
pub use transport::{AnalysisRequest, AnalysisTransport, RemoteResponse, TransportError};
pub use types::{AnalysisResult, OptionGroup, QuestionnaireData};

use crate::config::{AnalyzerConfig, Provider};
use std::sync::Arc;

/// Build the transport for the configured provider.
pub fn build_transport(config: &AnalyzerConfig) -> Result<Arc<dyn AnalysisTransport>, TransportError> {
    match config.provider {
        Provider::Proxy => {
            let endpoint = config
                .endpoint
                .as_deref()
                .filter(|e| !e.trim().is_empty())
                .ok_or_else(|| TransportError::Config("HAIRLINE_ENDPOINT is not set".to_string()))?;
            log::info!("[REMOTE] Using proxy transport: {}", endpoint);
            Ok(Arc::new(ProxyTransport::new(endpoint)))
        }
        Provider::Gemini => {
            let key = config
                .gemini_api_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| TransportError::Config("GEMINI_API_KEY is not set".to_string()))?;
            log::info!("[REMOTE] Using gemini transport ({})", config.gemini_model);
            Ok(Arc::new(GeminiTransport::new(key, config.gemini_model.clone())))
        }
    }
}

/// First `max_chars` characters of a body, for logs.
pub(crate) fn preview(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}
