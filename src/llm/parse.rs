//! Response body helpers shared by all transports and the classifier.
//!
//! - strip_code_fences: models sometimes wrap JSON in ```json fences
//! - parse_analysis: body → normalized AnalysisResult
//! - error_message: pull a human-readable error out of an error body
//! - wait_seconds_hint: "please retry in 32s" → 32

use super::types::AnalysisResult;
use regex::Regex;
use std::sync::OnceLock;

/// Strip a leading ```/```json fence and the trailing ``` if present.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the language tag line ("json", "JSON", or nothing).
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}

/// Parse a success body into a normalized result.
///
/// Fails when the body is not JSON, carries an `error` field, or lacks
/// the required analysis fields.
pub fn parse_analysis(body: &str) -> Result<AnalysisResult, String> {
    let json_text = strip_code_fences(body);
    let value: serde_json::Value =
        serde_json::from_str(&json_text).map_err(|e| format!("invalid JSON: {}", e))?;
    if let Some(msg) = error_message_from_value(&value) {
        return Err(format!("error body: {}", msg));
    }
    // Proxies sometimes wrap the payload: {"analysis": {...}} or {"result": {...}}.
    let wrapped = value
        .get("analysis")
        .or_else(|| value.get("result"))
        .filter(|v| v.is_object())
        .cloned();
    let inner = wrapped.unwrap_or(value);
    serde_json::from_value::<AnalysisResult>(inner)
        .map(AnalysisResult::normalize)
        .map_err(|e| format!("unexpected analysis shape: {}", e))
}

/// Extract an error message from a JSON error body, if there is one.
///
/// Accepts `{"error": "..."}`, `{"error": {"message": "..."}}` and
/// `{"message": "..."}` alongside a non-2xx status.
pub fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fences(body).as_str()).ok()?;
    error_message_from_value(&value).or_else(|| {
        value
            .get("message")
            .and_then(|m| m.as_str())
            .map(|s| s.to_string())
    })
}

/// Only the `error` field — used for 2xx bodies, where a top-level
/// `message` may be legitimate content.
pub fn error_field(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fences(body).as_str()).ok()?;
    error_message_from_value(&value)
}

fn error_message_from_value(value: &serde_json::Value) -> Option<String> {
    let err = value.get("error")?;
    match err {
        serde_json::Value::Null | serde_json::Value::Bool(false) => None,
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(obj) => Some(
            obj.get("message")
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| err.to_string()),
        ),
        other => Some(other.to_string()),
    }
}

/// Longest wait hint honoured; anything above is clamped.
pub const MAX_WAIT_HINT_SECS: u64 = 3_600;

fn wait_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // "Please retry in 32.5s", "try again in 30 seconds", "wait 45 sec"
            r"(?i)(?:retry|try again|wait)\D{0,12}?(\d+(?:\.\d+)?)\s*(?:s\b|sec|second)",
            // Gemini RetryInfo: "retryDelay": "30s"
            r#"(?i)retry_?delay"?\s*[:=]\s*"?(\d+(?:\.\d+)?)s"#,
            // "Retry-After: 30"
            r"(?i)retry-after\W{0,3}(\d+)",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Parse a wait-time hint (whole seconds, rounded up, at most
/// `MAX_WAIT_HINT_SECS`) from an error message.
pub fn wait_seconds_hint(message: &str) -> Option<u64> {
    wait_patterns().iter().find_map(|re| {
        let caps = re.captures(message)?;
        let secs: f64 = caps.get(1)?.as_str().parse().ok()?;
        (secs.is_finite() && secs > 0.0)
            .then(|| (secs.ceil() as u64).min(MAX_WAIT_HINT_SECS))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn parse_accepts_fenced_body() {
        let body = "```json\n{\"score\": 12, \"confidence\": 0.8, \"summary\": \"x\"}\n```";
        let r = parse_analysis(body).unwrap();
        assert_eq!(r.score, 10.0);
        assert!(!r.disclaimer.is_empty());
    }

    #[test]
    fn parse_unwraps_analysis_envelope() {
        let body = r#"{"analysis": {"score": 2, "confidence": 0.4, "summary": "y"}}"#;
        assert_eq!(parse_analysis(body).unwrap().summary, "y");
    }

    #[test]
    fn parse_rejects_error_body_and_garbage() {
        assert!(parse_analysis(r#"{"error": "boom"}"#).is_err());
        assert!(parse_analysis("<html>502</html>").is_err());
        assert!(parse_analysis(r#"{"summary": "missing score"}"#).is_err());
    }

    #[test]
    fn error_message_shapes() {
        assert_eq!(error_message(r#"{"error": "Too many requests"}"#).as_deref(), Some("Too many requests"));
        assert_eq!(
            error_message(r#"{"error": {"code": 429, "message": "Quota exceeded"}}"#).as_deref(),
            Some("Quota exceeded")
        );
        assert_eq!(error_message(r#"{"message": "nope"}"#).as_deref(), Some("nope"));
        assert_eq!(error_message("not json"), None);
        assert_eq!(error_field(r#"{"message": "hi", "score": 1}"#), None);
    }

    #[test]
    fn wait_hint_formats() {
        assert_eq!(wait_seconds_hint("Please retry in 32.5s."), Some(33));
        assert_eq!(wait_seconds_hint("Rate limited, try again in 30 seconds"), Some(30));
        assert_eq!(wait_seconds_hint(r#"{"retryDelay": "41s"}"#), Some(41));
        assert_eq!(wait_seconds_hint("Retry-After: 12"), Some(12));
        assert_eq!(wait_seconds_hint("rate limit exceeded"), None);
    }

    #[test]
    fn huge_wait_hint_is_clamped() {
        assert_eq!(
            wait_seconds_hint("Please retry in 99999999999999999999s"),
            Some(MAX_WAIT_HINT_SECS)
        );
        assert_eq!(wait_seconds_hint("Retry-After: 7200"), Some(MAX_WAIT_HINT_SECS));
    }
}
