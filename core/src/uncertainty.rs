//! Uncertainty Layer — the assumption-detection and hedge-scanning rules
//! behind §4.7's try-verify-feedback pattern.
//!
//! The pattern itself is inlined at each call site rather than routed
//! through a shared wrapper type, because the three callers disagree on
//! what "verify" and "feedback" mean for their result shape: the Canvas
//! Analyzer (`analyzer::analyze`) runs [`detect_assumptions`] once against
//! the ticket's summary/description and degrades each of its four sections
//! independently to a typed placeholder plus a `ConfigurationWarning`
//! (`analyzer/mod.rs`); the Regenerator (`regenerator::regenerate`) runs
//! [`detect_assumptions`] against the user's feedback text but fails hard
//! instead of degrading (§4.5); the Intent Engine's contextual pipeline
//! (`intent::contextual::respond`) runs [`detect_uncertainty`] over the
//! generated answer and only logs when it reads as hedged. A single
//! generic `PartialResult<T>`/`VerifiedOutcome<T>` wrapper would have had
//! to either erase those differences or branch on the caller anyway, so
//! this module exposes the rules and lets each caller apply them inline.

use serde::{Deserialize, Serialize};

use crate::schema::qa_profile::TestCaseFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssumptionCategory {
    DefaultFormat,
    AmbiguousRequest,
    ConflictingRequirements,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assumption {
    pub category: AssumptionCategory,
    pub description: String,
}

const VAGUE_VERBS: &[&str] = &["improve", "enhance", "better", "fix", "update"];

/// Detect the closed set of request-shaped assumption rules from §4.7.
/// `declared_format` is `None` when the caller's profile left
/// `test_case_format` unset at the transport boundary (before the schema
/// layer's own default kicks in) — a case this module still wants to
/// surface as an assumption even though [`TestCaseFormat`] itself has no
/// "unset" variant once parsed.
pub fn detect_assumptions(declared_format: Option<TestCaseFormat>, request_text: &str) -> Vec<Assumption> {
    let mut assumptions = Vec::new();
    let lower = request_text.to_lowercase();

    if declared_format.is_none() {
        assumptions.push(Assumption {
            category: AssumptionCategory::DefaultFormat,
            description: "test_case_format was not specified; defaulted to gherkin".to_string(),
        });
    }

    if VAGUE_VERBS.iter().any(|v| lower.contains(v)) {
        assumptions.push(Assumption {
            category: AssumptionCategory::AmbiguousRequest,
            description: "the request uses a vague improvement verb without specifics; \
                interpreted broadly"
                .to_string(),
        });
    }

    if lower.contains("comprehensive") && lower.contains("simple") {
        assumptions.push(Assumption {
            category: AssumptionCategory::ConflictingRequirements,
            description: "the request asks for both \"comprehensive\" and \"simple\" coverage; \
                these conflict and comprehensiveness was prioritized"
                .to_string(),
        });
    }

    assumptions
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UncertaintyReport {
    pub uncertain: bool,
    pub confidence_score: f64,
    pub indicators: Vec<String>,
}

const HEDGE_PHRASES: &[&str] = &["i'm not sure", "maybe", "possibly", "i think", "perhaps", "might be"];

/// Scan an AI text response for hedge phrases, multiple question marks, and
/// extreme brevity. Returns a confidence score in `[0, 1]` — one indicator
/// found costs 0.2, capped so a response riddled with hedges still reads as
/// near-zero confidence rather than negative.
pub fn detect_uncertainty(text: &str) -> UncertaintyReport {
    let lower = text.to_lowercase();
    let mut indicators = Vec::new();

    for phrase in HEDGE_PHRASES {
        if lower.contains(phrase) {
            indicators.push(format!("hedge phrase: \"{phrase}\""));
        }
    }

    let question_marks = text.matches('?').count();
    if question_marks >= 2 {
        indicators.push(format!("{question_marks} question marks"));
    }

    let word_count = text.split_whitespace().count();
    if word_count > 0 && word_count < 5 {
        indicators.push("extremely brief response".to_string());
    }

    let confidence_score = (1.0 - 0.2 * indicators.len() as f64).max(0.0);
    UncertaintyReport {
        uncertain: !indicators.is_empty(),
        confidence_score,
        indicators,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_format_is_an_assumption() {
        let assumptions = detect_assumptions(None, "make it better");
        assert!(assumptions
            .iter()
            .any(|a| a.category == AssumptionCategory::DefaultFormat));
    }

    #[test]
    fn vague_verb_is_flagged() {
        let assumptions = detect_assumptions(Some(TestCaseFormat::Steps), "please improve this");
        assert!(assumptions
            .iter()
            .any(|a| a.category == AssumptionCategory::AmbiguousRequest));
    }

    #[test]
    fn comprehensive_and_simple_conflict() {
        let assumptions = detect_assumptions(
            Some(TestCaseFormat::Steps),
            "make it comprehensive but keep it simple",
        );
        assert!(assumptions
            .iter()
            .any(|a| a.category == AssumptionCategory::ConflictingRequirements));
    }

    #[test]
    fn plain_request_has_no_assumptions() {
        let assumptions = detect_assumptions(Some(TestCaseFormat::Table), "add a test for login");
        assert!(assumptions.is_empty());
    }

    #[test]
    fn hedge_phrases_lower_confidence() {
        let report = detect_uncertainty("I'm not sure, but maybe this works?");
        assert!(report.uncertain);
        assert!(report.confidence_score < 1.0);
    }

    #[test]
    fn confident_response_has_no_indicators() {
        let report = detect_uncertainty(
            "The login button fails to respond because the click handler was never bound.",
        );
        assert!(!report.uncertain);
        assert_eq!(report.confidence_score, 1.0);
    }

    #[test]
    fn extreme_brevity_is_flagged() {
        let report = detect_uncertainty("Not sure.");
        assert!(report.uncertain);
    }
}
