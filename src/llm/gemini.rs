//! Gemini Flash transport — direct-to-provider, no backend in between.
//!
//! Key differences from the proxy transport:
//! - API key in URL query param, not header
//! - photos go as `inlineData` parts next to the text prompt
//! - `responseMimeType: "application/json"` enforces valid JSON
//! - on 2xx the model text (`candidates[0].content.parts[0].text`) is
//!   returned as the body, so the classifier sees the same shape as the proxy
//! - on errors the Google error body is passed through as-is

use super::prompts::{build_analysis_message, ANALYSIS_SYSTEM_PROMPT, MAX_OUTPUT_TOKENS};
use super::transport::{AnalysisRequest, AnalysisTransport, RemoteResponse, TransportError};
use crate::capture::EncodedImage;
use async_trait::async_trait;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiTransport {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiTransport {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    fn build_body(&self, request: &AnalysisRequest) -> serde_json::Value {
        let mut parts: Vec<serde_json::Value> = request
            .photos
            .iter()
            .map(|p| {
                let img = EncodedImage::from_data_url(&p.image);
                serde_json::json!({
                    "inlineData": {
                        "mimeType": img.mime_type(),
                        "data": img.base64(),
                    }
                })
            })
            .collect();
        parts.push(serde_json::json!({ "text": build_analysis_message(request) }));

        serde_json::json!({
            "contents": [
                {
                    "role": "user",
                    "parts": parts
                }
            ],
            "systemInstruction": {
                "parts": [
                    {
                        "text": ANALYSIS_SYSTEM_PROMPT
                    }
                ]
            },
            "generationConfig": {
                "maxOutputTokens": MAX_OUTPUT_TOKENS,
                "temperature": 0.2,
                "responseMimeType": "application/json"
            }
        })
    }
}

#[async_trait]
impl AnalysisTransport for GeminiTransport {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn submit(&self, request: &AnalysisRequest) -> Result<RemoteResponse, TransportError> {
        if self.api_key.is_empty() {
            return Err(TransportError::Config("GEMINI_API_KEY is empty".to_string()));
        }

        log::info!("[REMOTE] Provider: gemini");
        log::info!("[REMOTE] Model: {}", self.model);
        let start = std::time::Instant::now();

        let url = format!(
            "{}/{}:generateContent?key={}",
            GEMINI_BASE_URL, self.model, self.api_key
        );

        let resp = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(|e| {
                // reqwest includes the URL in its Display — strip the key.
                let msg = e.without_url().to_string();
                log::error!("[REMOTE] HTTP request failed: {}", msg);
                TransportError::Request(msg)
            })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            log::error!("[REMOTE] Failed to read Gemini body: {}", e);
            TransportError::Body(e.without_url().to_string())
        })?;
        log::info!(
            "[REMOTE] Gemini returned {} in {}ms",
            status,
            start.elapsed().as_millis()
        );

        if !(200..300).contains(&status) {
            log::warn!("[REMOTE] Gemini error body: {}", super::preview(&body, 200));
            return Ok(RemoteResponse { status, body });
        }

        if let Some((input, output)) = extract_usage(&body) {
            log::info!("[REMOTE] Input tokens: {}", input);
            log::info!("[REMOTE] Output tokens: {}", output);
        }

        // A 2xx without candidate text (safety block, empty response) is passed
        // through unchanged; the classifier treats it as a malformed body.
        let text = extract_gemini_text(&body).unwrap_or(body);
        Ok(RemoteResponse { status, body: text })
    }
}

/// Extract text content from a Gemini response body.
///
/// Gemini format: candidates[0].content.parts[0].text
fn extract_gemini_text(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    json.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(|s| s.to_string())
}

fn extract_usage(body: &str) -> Option<(u64, u64)> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    let usage = json.get("usageMetadata")?;
    Some((
        usage["promptTokenCount"].as_u64().unwrap_or(0),
        usage["candidatesTokenCount"].as_u64().unwrap_or(0),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{PhotoSlot, PreparedPhoto};
    use crate::llm::types::QuestionnaireData;

    #[test]
    fn extracts_candidate_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"score\":3}"}]}}],
                       "usageMetadata":{"promptTokenCount":1200,"candidatesTokenCount":300}}"#;
        assert_eq!(extract_gemini_text(body).as_deref(), Some("{\"score\":3}"));
        assert_eq!(extract_usage(body), Some((1200, 300)));
    }

    #[test]
    fn missing_candidates_yield_none() {
        assert_eq!(extract_gemini_text(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#), None);
    }

    #[test]
    fn body_has_one_inline_part_per_photo_plus_prompt() {
        let photos = vec![
            PreparedPhoto {
                slot: PhotoSlot::Front,
                image: EncodedImage::new("image/jpeg", "AAAA"),
            },
            PreparedPhoto {
                slot: PhotoSlot::Left,
                image: EncodedImage::new("image/jpeg", "BBBB"),
            },
        ];
        let req = AnalysisRequest::new(&photos, &QuestionnaireData::default());
        let body = GeminiTransport::new("k", "m").build_body(&req);
        let parts = body["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["inlineData"]["data"], "AAAA");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert!(parts[2]["text"].as_str().unwrap().contains("front, left"));
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }
}
