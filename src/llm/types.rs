//! Analysis request/response types.
//!
//! The remote endpoint returns JSON that deserializes directly into
//! `AnalysisResult`. Every result goes through `normalize()` before it is
//! surfaced, so callers can rely on the range and disclaimer invariants.

use serde::{Deserialize, Serialize};

/// Shown when the remote omits a disclaimer. Never empty.
pub const DEFAULT_DISCLAIMER: &str = "This analysis is for entertainment and educational purposes only. \
It is not a medical diagnosis. Consult a board-certified dermatologist for any concerns about hair loss.";

pub const MAX_SCORE: f64 = 10.0;

/// Questionnaire answers collected alongside the photos.
///
/// All fields are free-form; missing answers are sent as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireData {
    #[serde(default)]
    pub age_range: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub family_history: Option<String>,
    #[serde(default)]
    pub routine_frequency: Option<String>,
    #[serde(default)]
    pub care_level: Option<String>,
}

/// Wire form of the questionnaire: every field present, absent → "".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnairePayload {
    pub age_range: String,
    pub duration: String,
    pub family_history: String,
    pub routine_frequency: String,
    pub care_level: String,
}

impl QuestionnaireData {
    pub fn normalized(&self) -> QuestionnairePayload {
        let field = |v: &Option<String>| v.as_deref().map(str::trim).unwrap_or_default().to_string();
        QuestionnairePayload {
            age_range: field(&self.age_range),
            duration: field(&self.duration),
            family_history: field(&self.family_history),
            routine_frequency: field(&self.routine_frequency),
            care_level: field(&self.care_level),
        }
    }
}

/// A titled group of suggestions ("Lifestyle", "Treatments to discuss", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionGroup {
    pub title: String,
    #[serde(default)]
    pub bullets: Vec<String>,
}

/// The analysis returned to callers — real or fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 0 (no visible recession) to 10.
    pub score: f64,
    /// 0–1. Exactly 0 for fallback results; 0 when the remote omits it.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub observations: Vec<String>,
    #[serde(default, alias = "likelyPatterns")]
    pub likely_patterns: Vec<String>,
    #[serde(default)]
    pub options: Vec<OptionGroup>,
    #[serde(default, alias = "seeDermatologistIf", alias = "dermatologist_triggers")]
    pub see_dermatologist_if: Vec<String>,
    #[serde(default)]
    pub disclaimer: String,
    #[serde(default, alias = "hairlineType", skip_serializing_if = "Option::is_none")]
    pub hairline_type: Option<String>,
    #[serde(default, alias = "hairlineDescription", skip_serializing_if = "Option::is_none")]
    pub hairline_description: Option<String>,
    #[serde(default, alias = "personalizedTips", skip_serializing_if = "Option::is_none")]
    pub personalized_tips: Option<Vec<String>>,
}

impl AnalysisResult {
    /// Clamp numeric fields into range and guarantee a disclaimer.
    pub fn normalize(mut self) -> Self {
        self.score = clamp_finite(self.score, 0.0, MAX_SCORE);
        self.confidence = clamp_finite(self.confidence, 0.0, 1.0);
        if self.disclaimer.trim().is_empty() {
            self.disclaimer = DEFAULT_DISCLAIMER.to_string();
        }
        self
    }
}

fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> AnalysisResult {
        serde_json::from_str(r#"{"score": 4.5, "confidence": 0.7, "summary": "ok"}"#).unwrap()
    }

    #[test]
    fn score_alone_is_a_valid_result() {
        let r: AnalysisResult = serde_json::from_str(r#"{"score": 3.2}"#).unwrap();
        let r = r.normalize();
        assert_eq!(r.confidence, 0.0);
        assert!(r.summary.is_empty());
        assert!(!r.disclaimer.is_empty());
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let r = minimal();
        assert!(r.observations.is_empty());
        assert!(r.options.is_empty());
        assert!(r.hairline_type.is_none());
    }

    #[test]
    fn normalize_clamps_out_of_range_values() {
        let mut r = minimal();
        r.score = 14.0;
        r.confidence = -0.3;
        let r = r.normalize();
        assert_eq!(r.score, 10.0);
        assert_eq!(r.confidence, 0.0);
    }

    #[test]
    fn normalize_replaces_nan() {
        let mut r = minimal();
        r.score = f64::NAN;
        assert_eq!(r.normalize().score, 0.0);
    }

    #[test]
    fn normalize_fills_empty_disclaimer() {
        let r = minimal().normalize();
        assert_eq!(r.disclaimer, DEFAULT_DISCLAIMER);
    }

    #[test]
    fn camel_case_aliases_are_accepted() {
        let r: AnalysisResult = serde_json::from_str(
            r#"{"score": 3, "confidence": 0.5, "summary": "s",
                "likelyPatterns": ["Norwood 2"], "hairlineType": "mature",
                "personalizedTips": ["sleep more"]}"#,
        )
        .unwrap();
        assert_eq!(r.likely_patterns, vec!["Norwood 2"]);
        assert_eq!(r.hairline_type.as_deref(), Some("mature"));
        assert_eq!(r.personalized_tips.unwrap().len(), 1);
    }

    #[test]
    fn questionnaire_absent_fields_become_empty_strings() {
        let q = QuestionnaireData {
            age_range: Some(" 25-34 ".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(q.normalized()).unwrap();
        assert_eq!(json["ageRange"], "25-34");
        assert_eq!(json["familyHistory"], "");
        assert_eq!(json["careLevel"], "");
    }
}
