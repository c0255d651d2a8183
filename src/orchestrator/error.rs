//! Failure taxonomy surfaced to the UI.

use serde::Serialize;

/// Mutually exclusive failure tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Cooldown,
    PayloadTooLarge,
    RateLimit,
    ServerError,
    NetworkError,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Cooldown => "cooldown",
            ErrorKind::PayloadTooLarge => "payload_too_large",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::ServerError => "server_error",
            ErrorKind::NetworkError => "network_error",
        }
    }

    /// Whether this kind may be accompanied by a fallback result.
    pub fn fallback_eligible(self) -> bool {
        matches!(self, ErrorKind::ServerError | ErrorKind::NetworkError)
    }

    /// Whether the user should be offered a manual retry.
    pub fn manual_retry_offered(self) -> bool {
        !matches!(self, ErrorKind::Cooldown | ErrorKind::PayloadTooLarge)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-visible failure: message, optional tag, optional countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: Option<ErrorKind>,
    pub message: String,
    /// Epoch ms until which the user should wait (cooldown / rate limit).
    pub wait_until_ms: Option<u64>,
}

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind: Some(kind),
            message: message.into(),
            wait_until_ms: None,
        }
    }

    /// Message-only failure with no taxonomy tag ("nothing to retry").
    pub fn untagged(message: impl Into<String>) -> Self {
        Self {
            kind: None,
            message: message.into(),
            wait_until_ms: None,
        }
    }

    pub fn with_wait_until(mut self, until_ms: u64) -> Self {
        self.wait_until_ms = Some(until_ms);
        self
    }

    pub fn cooldown(remaining_secs: u64, until_ms: u64) -> Self {
        Failure::new(
            ErrorKind::Cooldown,
            format!(
                "Please wait {} second{} before starting another analysis.",
                remaining_secs,
                if remaining_secs == 1 { "" } else { "s" }
            ),
        )
        .with_wait_until(until_ms)
    }

    pub fn no_photos() -> Self {
        Failure::new(
            ErrorKind::NetworkError,
            "No photos to analyze. Take at least one photo first.",
        )
    }

    pub fn nothing_to_retry() -> Self {
        Failure::untagged("Nothing to retry. Start a new analysis first.")
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == Some(kind)
    }
}
