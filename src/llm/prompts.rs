//! Prompt for the direct-to-provider transport.
//!
//! The proxy backend owns its own copy of this prompt. Keep the JSON
//! schema here in sync with `AnalysisResult`.

use super::transport::AnalysisRequest;

pub const GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const MAX_OUTPUT_TOKENS: u32 = 1024;

pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a hairline assessment assistant for an entertainment and educational app. The user has taken photos of their hairline (front, and optionally left and right temples) and answered a short questionnaire. You do NOT diagnose medical conditions.

<rules>
1. ALWAYS respond with a single JSON object matching the schema below. No prose, no markdown.
2. Base observations only on what is visible in the photos. If a photo is blurry or the hairline is covered, say so in observations and lower confidence.
3. score is 0 (no visible recession) to 10 (extensive recession). confidence is 0 to 1.
4. Never name a medication dosage. Treatments may only be listed as "options to discuss with a dermatologist".
5. disclaimer must state that this is not a medical diagnosis.
</rules>

<schema>
{
  "score": number,
  "confidence": number,
  "summary": string,
  "observations": [string],
  "likely_patterns": [string],
  "options": [{"title": string, "bullets": [string]}],
  "see_dermatologist_if": [string],
  "disclaimer": string,
  "hairline_type": string,
  "hairline_description": string,
  "personalized_tips": [string]
}
</schema>"#;

/// Build the user message: which angles are attached + questionnaire answers.
pub fn build_analysis_message(request: &AnalysisRequest) -> String {
    let angles: Vec<&str> = request.photos.iter().map(|p| p.angle.as_str()).collect();
    let q = &request.questionnaire;
    let answer = |v: &str| if v.is_empty() { "not provided".to_string() } else { v.to_string() };

    format!(
        "Photos attached (in order): {}\n\
         Questionnaire:\n\
         - Age range: {}\n\
         - Noticed changes for: {}\n\
         - Family history of hair loss: {}\n\
         - Hair care routine frequency: {}\n\
         - Care level: {}\n\
         Return the JSON analysis.",
        angles.join(", "),
        answer(&q.age_range),
        answer(&q.duration),
        answer(&q.family_history),
        answer(&q.routine_frequency),
        answer(&q.care_level),
    )
}
