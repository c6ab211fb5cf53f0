//! Target-section detection — step 2 of the Intent Engine pipeline, run only
//! for `modify_canvas` classifications.
//!
//! Hybrid: the keyword lexicon always runs first and is cheap. A phrase at or
//! above 0.7 confidence is accepted outright ("primary"); one in [0.4, 0.7)
//! is "secondary" and only kept if a generative pass agrees. The generative
//! pass itself is skipped whenever the keyword pass already found at least
//! one primary match and its top confidence is >= 0.6, since in that case
//! the extra call would not change the outcome often enough to be worth the
//! latency (§4.5).

use crate::gateway::ProviderGateway;
use crate::schema::canvas::{CanvasSection, QACanvasDocument};

use super::lexicon;
use super::prompts;

const PRIMARY_THRESHOLD: f64 = 0.7;
const SECONDARY_THRESHOLD: f64 = 0.4;
const SKIP_AI_CONFIDENCE: f64 = 0.6;

#[derive(serde::Deserialize)]
struct AiTarget {
    section: CanvasSection,
    confidence: f64,
}

#[derive(serde::Deserialize)]
struct AiTargetResponse {
    targets: Vec<AiTarget>,
    #[serde(default)]
    #[allow(dead_code)]
    keywords: Vec<String>,
}

pub struct TargetDetection {
    pub sections: Vec<CanvasSection>,
    pub keywords: Vec<String>,
}

/// Detect which canvas sections a `modify_canvas` message is targeting.
pub async fn detect_targets(
    gateway: &ProviderGateway,
    message: &str,
    canvas: Option<&QACanvasDocument>,
) -> TargetDetection {
    let matches = lexicon::match_sections(message);
    let keywords = lexicon::matched_phrases(message);

    let primary: Vec<CanvasSection> = matches
        .iter()
        .filter(|(_, c)| *c >= PRIMARY_THRESHOLD)
        .map(|(s, _)| *s)
        .collect();
    let secondary: Vec<(CanvasSection, f64)> = matches
        .iter()
        .filter(|(_, c)| *c >= SECONDARY_THRESHOLD && *c < PRIMARY_THRESHOLD)
        .cloned()
        .collect();

    let top_confidence = matches.iter().map(|(_, c)| *c).fold(0.0_f64, f64::max);

    let skip_ai = !primary.is_empty() && top_confidence >= SKIP_AI_CONFIDENCE;
    if skip_ai {
        return TargetDetection {
            sections: primary,
            keywords,
        };
    }

    let (system, user) = prompts::target_detection_prompt(message, canvas);
    let ai_sections = match gateway.generate_object(&system, &user).await {
        Ok(value) => serde_json::from_value::<AiTargetResponse>(value)
            .ok()
            .map(|r| {
                r.targets
                    .into_iter()
                    .filter(|t| t.confidence >= SECONDARY_THRESHOLD)
                    .map(|t| t.section)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default(),
        Err(_) => Vec::new(),
    };

    let mut sections = primary;
    for (section, _) in secondary {
        if ai_sections.contains(&section) && !sections.contains(&section) {
            sections.push(section);
        }
    }
    for section in ai_sections {
        if !sections.contains(&section) {
            sections.push(section);
        }
    }

    if sections.is_empty() {
        // Nothing survived the hybrid pass: fall back to every section the
        // lexicon saw at all, so downstream dispatch has something to act on
        // rather than silently touching nothing.
        sections = matches.into_iter().map(|(s, _)| s).collect();
    }

    TargetDetection { sections, keywords }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_threshold_accepts_direct_phrase() {
        let matches = lexicon::match_sections("update the acceptance criteria");
        let (_, confidence) = matches
            .iter()
            .find(|(s, _)| *s == CanvasSection::AcceptanceCriteria)
            .unwrap();
        assert!(*confidence >= PRIMARY_THRESHOLD);
    }

    #[test]
    fn weak_generic_phrase_is_secondary_only() {
        let matches = lexicon::match_sections("check the test coverage");
        let (_, confidence) = matches
            .iter()
            .find(|(s, _)| *s == CanvasSection::TestCases)
            .unwrap();
        assert!(*confidence >= SECONDARY_THRESHOLD && *confidence < PRIMARY_THRESHOLD);
    }
}
