//! Response classification and the retry decision table.
//!
//! `classify` turns one transport outcome into a `Classification`;
//! `decide` maps (classification, attempt) to what the loop does next.
//! Both are pure, so the "only 503 retries" rule is testable without a
//! transport.

use super::error::ErrorKind;
use crate::config::RetryPolicy;
use crate::llm::parse;
use crate::llm::transport::{RemoteResponse, TransportError};
use crate::llm::AnalysisResult;
use std::time::Duration;

pub const STATUS_PAYLOAD_TOO_LARGE: u16 = 413;
pub const STATUS_RATE_LIMITED: u16 = 429;
pub const STATUS_SERVICE_UNAVAILABLE: u16 = 503;

/// How much of a non-JSON error body is scanned for rate-limit / size hints.
const MAX_RAW_MESSAGE_CHARS: usize = 500;

/// What one attempt produced, in classifier priority order.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    PayloadTooLarge,
    RateLimited { wait_hint: Option<u64> },
    Unavailable,
    /// Non-retriable: other remote error (`ServerError`) or transport /
    /// malformed body (`NetworkError`).
    Failed { kind: ErrorKind, detail: String },
    Success(AnalysisResult),
}

/// What the request loop does next.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Accept(AnalysisResult),
    /// Terminal user-facing error, no fallback.
    Surface { kind: ErrorKind, wait_hint: Option<u64> },
    Backoff(Duration),
    Fallback { kind: ErrorKind, detail: String },
}

/// Per-call attempt bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttemptState {
    /// 0-based.
    pub attempt: u32,
    pub last_status: Option<u16>,
    pub single_photo: bool,
}

impl AttemptState {
    pub fn new(single_photo: bool) -> Self {
        Self {
            attempt: 0,
            last_status: None,
            single_photo,
        }
    }
}

fn mentions_too_large(text: &str) -> bool {
    let t = text.to_lowercase();
    t.contains("413")
        || t.contains("too large")
        || t.contains("entity too large")
        || t.contains("payload too large")
        || t.contains("request size")
}

fn mentions_rate_limit(text: &str) -> bool {
    let t = text.to_lowercase();
    t.contains("429")
        || t.contains("rate limit")
        || t.contains("rate-limit")
        || t.contains("too many requests")
        || t.contains("quota")
        || t.contains("resource_exhausted")
}

pub fn classify(outcome: Result<RemoteResponse, TransportError>) -> Classification {
    let response = match outcome {
        Ok(r) => r,
        Err(e) => {
            return Classification::Failed {
                kind: ErrorKind::NetworkError,
                detail: e.to_string(),
            }
        }
    };

    let message = if response.is_success() {
        parse::error_field(&response.body)
    } else {
        parse::error_message(&response.body)
    };
    // Gateways often answer with plain text or HTML; scan that as the message.
    let raw_text = match &message {
        None if !response.is_success() => crate::llm::preview(&response.body, MAX_RAW_MESSAGE_CHARS),
        _ => String::new(),
    };
    let message_text = message.as_deref().unwrap_or(&raw_text);

    // Message-content checks only apply to bodies that are errors, so a real
    // analysis mentioning "quota" in its summary is never misread.
    let is_error_body = !response.is_success() || message.is_some();

    if response.status == STATUS_PAYLOAD_TOO_LARGE || (is_error_body && mentions_too_large(message_text)) {
        return Classification::PayloadTooLarge;
    }
    if response.status == STATUS_RATE_LIMITED || (is_error_body && mentions_rate_limit(message_text)) {
        let wait_hint = parse::wait_seconds_hint(message_text)
            .or_else(|| parse::wait_seconds_hint(&response.body));
        return Classification::RateLimited { wait_hint };
    }
    if response.status == STATUS_SERVICE_UNAVAILABLE {
        return Classification::Unavailable;
    }
    if !response.is_success() {
        let detail = match message {
            Some(m) => format!("HTTP {}: {}", response.status, m),
            None => format!("HTTP {}", response.status),
        };
        return Classification::Failed {
            kind: ErrorKind::ServerError,
            detail,
        };
    }
    if let Some(m) = message {
        return Classification::Failed {
            kind: ErrorKind::ServerError,
            detail: m,
        };
    }

    match parse::parse_analysis(&response.body) {
        Ok(result) => Classification::Success(result),
        Err(detail) => Classification::Failed {
            kind: ErrorKind::NetworkError,
            detail: format!("malformed response: {}", detail),
        },
    }
}

/// Decide the next step after `attempt` (0-based) produced `classification`.
pub fn decide(classification: Classification, attempt: u32, policy: &RetryPolicy) -> Decision {
    match classification {
        Classification::Success(result) => Decision::Accept(result),
        Classification::PayloadTooLarge => Decision::Surface {
            kind: ErrorKind::PayloadTooLarge,
            wait_hint: None,
        },
        Classification::RateLimited { wait_hint } => Decision::Surface {
            kind: ErrorKind::RateLimit,
            wait_hint,
        },
        Classification::Unavailable if attempt + 1 < policy.max_attempts => {
            Decision::Backoff(policy.delay_for(attempt))
        }
        Classification::Unavailable => Decision::Fallback {
            kind: ErrorKind::ServerError,
            detail: format!(
                "service unavailable after {} attempt{}",
                attempt + 1,
                if attempt == 0 { "" } else { "s" }
            ),
        },
        Classification::Failed { kind, detail } => Decision::Fallback { kind, detail },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"{"score": 4, "confidence": 0.8, "summary": "fine"}"#;

    fn ok(status: u16, body: &str) -> Result<RemoteResponse, TransportError> {
        Ok(RemoteResponse::new(status, body))
    }

    #[test]
    fn status_codes_classify() {
        assert_eq!(classify(ok(413, "")), Classification::PayloadTooLarge);
        assert_eq!(
            classify(ok(429, "")),
            Classification::RateLimited { wait_hint: None }
        );
        assert_eq!(classify(ok(503, "")), Classification::Unavailable);
        assert!(matches!(
            classify(ok(500, "oops")),
            Classification::Failed { kind: ErrorKind::ServerError, .. }
        ));
        assert!(matches!(classify(ok(200, VALID)), Classification::Success(_)));
    }

    #[test]
    fn message_content_classifies_without_status() {
        assert_eq!(
            classify(ok(500, r#"{"error": "Request Entity Too Large"}"#)),
            Classification::PayloadTooLarge
        );
        assert_eq!(
            classify(ok(200, r#"{"error": "Rate limit exceeded. Please retry in 17s."}"#)),
            Classification::RateLimited { wait_hint: Some(17) }
        );
        assert_eq!(
            classify(ok(400, r#"{"error": {"code": 429, "message": "Quota exceeded"}}"#)),
            Classification::RateLimited { wait_hint: None }
        );
    }

    #[test]
    fn plain_text_error_bodies_classify_by_content() {
        assert_eq!(
            classify(ok(500, "Rate limit exceeded. Please retry in 10s.")),
            Classification::RateLimited { wait_hint: Some(10) }
        );
        assert_eq!(
            classify(ok(502, "<html><h1>413 Request Entity Too Large</h1></html>")),
            Classification::PayloadTooLarge
        );
        assert!(matches!(
            classify(ok(502, "<html><h1>Bad Gateway</h1></html>")),
            Classification::Failed { kind: ErrorKind::ServerError, .. }
        ));
        assert_eq!(classify(ok(503, "Service Unavailable")), Classification::Unavailable);
    }

    #[test]
    fn too_large_wins_over_rate_limit() {
        assert_eq!(
            classify(ok(429, r#"{"error": "payload too large"}"#)),
            Classification::PayloadTooLarge
        );
    }

    #[test]
    fn success_body_mentioning_quota_is_still_success() {
        let body = r#"{"score": 4, "confidence": 0.8, "summary": "No rate limit on good genes"}"#;
        assert!(matches!(classify(ok(200, body)), Classification::Success(_)));
    }

    #[test]
    fn transport_and_malformed_are_network_errors() {
        assert!(matches!(
            classify(Err(TransportError::Request("connection refused".into()))),
            Classification::Failed { kind: ErrorKind::NetworkError, .. }
        ));
        assert!(matches!(
            classify(ok(200, "<html>not json</html>")),
            Classification::Failed { kind: ErrorKind::NetworkError, .. }
        ));
    }

    #[test]
    fn error_field_on_200_is_server_error() {
        assert!(matches!(
            classify(ok(200, r#"{"error": "model overloaded"}"#)),
            Classification::Failed { kind: ErrorKind::ServerError, .. }
        ));
    }

    #[test]
    fn only_unavailable_backs_off() {
        let policy = RetryPolicy::default();
        assert_eq!(
            decide(Classification::Unavailable, 0, &policy),
            Decision::Backoff(Duration::from_secs(2))
        );
        assert_eq!(
            decide(Classification::Unavailable, 1, &policy),
            Decision::Backoff(Duration::from_secs(4))
        );
        assert!(matches!(
            decide(Classification::Unavailable, 2, &policy),
            Decision::Fallback { kind: ErrorKind::ServerError, .. }
        ));
        let failed = Classification::Failed {
            kind: ErrorKind::ServerError,
            detail: "HTTP 500".into(),
        };
        assert!(matches!(decide(failed, 0, &policy), Decision::Fallback { .. }));
    }

    #[test]
    fn terminal_kinds_never_fall_back() {
        let policy = RetryPolicy::default();
        assert_eq!(
            decide(Classification::PayloadTooLarge, 0, &policy),
            Decision::Surface { kind: ErrorKind::PayloadTooLarge, wait_hint: None }
        );
        assert_eq!(
            decide(Classification::RateLimited { wait_hint: Some(9) }, 1, &policy),
            Decision::Surface { kind: ErrorKind::RateLimit, wait_hint: Some(9) }
        );
    }
}
