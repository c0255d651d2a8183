//! Demo result for when the real analysis cannot be obtained.
//!
//! The result is always schema-valid and always clearly labeled:
//! confidence is pinned to 0 and the disclaimer says it is simulated.

use super::types::{AnalysisResult, OptionGroup};
use rand::Rng;

/// Fallback scores are drawn from this low-to-moderate band.
pub const FALLBACK_SCORE_MIN: f64 = 3.0;
pub const FALLBACK_SCORE_MAX: f64 = 6.0;

pub const FALLBACK_DISCLAIMER: &str = "DEMO RESULT: This is a simulated result, not a real analysis. \
The analysis service was unavailable, so placeholder content is shown. \
It is for entertainment and educational purposes only and is not medical advice.";

/// Build a fallback result using thread-local randomness.
pub fn fallback_result() -> AnalysisResult {
    fallback_result_with(&mut rand::thread_rng())
}

/// Build a fallback result from the given RNG (seeded in tests).
pub fn fallback_result_with<R: Rng + ?Sized>(rng: &mut R) -> AnalysisResult {
    let raw: f64 = rng.gen_range(FALLBACK_SCORE_MIN..=FALLBACK_SCORE_MAX);
    let score = (raw * 10.0).round() / 10.0;

    AnalysisResult {
        score,
        confidence: 0.0,
        summary: "[Demo] We couldn't reach the analysis service, so this is a sample result. \
                  Try again in a moment for a real analysis."
            .to_string(),
        observations: vec![
            "[Demo] Sample observation: hairline shape not evaluated".to_string(),
            "[Demo] Sample observation: temple area not evaluated".to_string(),
            "[Demo] Sample observation: crown density not evaluated".to_string(),
        ],
        likely_patterns: vec!["[Demo] Pattern not determined (simulated result)".to_string()],
        options: vec![
            OptionGroup {
                title: "[Demo] General hair care".to_string(),
                bullets: vec![
                    "Use a gentle shampoo and avoid excessive heat styling".to_string(),
                    "Keep a consistent sleep schedule and balanced diet".to_string(),
                ],
            },
            OptionGroup {
                title: "[Demo] Next steps".to_string(),
                bullets: vec![
                    "Retry the analysis when the service is available".to_string(),
                    "Take well-lit photos with hair pulled back from the forehead".to_string(),
                ],
            },
        ],
        see_dermatologist_if: vec![
            "Sudden or patchy hair loss".to_string(),
            "Scalp pain, itching, redness or scaling".to_string(),
            "Rapid thinning over a few months".to_string(),
        ],
        disclaimer: FALLBACK_DISCLAIMER.to_string(),
        hairline_type: None,
        hairline_description: None,
        personalized_tips: None,
    }
}
