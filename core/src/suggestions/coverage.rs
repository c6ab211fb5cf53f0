//! Coverage-gap analysis — rule-based suggestions derived from correlating
//! acceptance criteria against the test cases meant to cover them (§4.6).

use crate::schema::canvas::{AcPriority, CanvasSection, QACanvasDocument, TestCase};
use crate::schema::qa_profile::QA_CATEGORY_KEYS;
use crate::schema::suggestion::{Effort, Priority, Suggestion, SuggestionType};

const COMMON_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "to", "of", "in", "on", "for", "with", "is", "are", "be", "it",
    "that", "this", "as", "should", "must", "can", "will", "user", "system",
];

const NEGATIVE_PATTERNS: &[&str] = &["should not", "invalid", "reject"];
const EDGE_CASE_PATTERNS: &[&str] =
    &["boundary", "maximum", "minimum", "empty", "null", "special character"];

fn significant_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2 && !COMMON_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

fn any_test_case_mentions(test_cases: &[TestCase], words: &[String]) -> bool {
    test_cases.iter().any(|tc| {
        let haystack = tc.searchable_text().to_lowercase();
        words.iter().any(|w| haystack.contains(w.as_str()))
    })
}

/// One [`Suggestion`] per acceptance criterion whose title keywords appear in
/// no test case, plus the three document-wide gaps (category coverage,
/// negative tests, edge cases).
pub fn find_gaps(canvas: &QACanvasDocument) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    for ac in &canvas.acceptance_criteria {
        let words = significant_words(&ac.title);
        if words.is_empty() || any_test_case_mentions(&canvas.test_cases, &words) {
            continue;
        }
        let priority = if ac.priority == AcPriority::Must {
            Priority::High
        } else {
            Priority::Medium
        };
        suggestions.push(Suggestion {
            id: String::new(),
            suggestion_type: SuggestionType::CoverageGap,
            title: format!("No test case covers \"{}\"", ac.title),
            description: format!(
                "Acceptance criterion {} (\"{}\") has no test case whose content mentions its \
                 key terms.",
                ac.id, ac.title
            ),
            target_section: Some(CanvasSection::TestCases),
            priority,
            reasoning: "keyword correspondence between acceptance criteria and test cases found \
                no match"
                .to_string(),
            implementation_hint: Some(format!("Add a test case exercising: {}", ac.title)),
            estimated_effort: Some(Effort::Medium),
            related_requirements: vec![ac.id.clone()],
            tags: words,
        });
    }

    for category in QA_CATEGORY_KEYS {
        if !canvas.metadata.qa_profile.is_category_active(category) {
            continue;
        }
        let covered = canvas
            .test_cases
            .iter()
            .any(|tc| tc.envelope().category.eq_ignore_ascii_case(category));
        if !covered {
            suggestions.push(Suggestion {
                id: String::new(),
                suggestion_type: SuggestionType::CoverageGap,
                title: format!("No test case in the \"{category}\" category"),
                description: format!(
                    "The \"{category}\" QA category is enabled but no test case is tagged with \
                     it."
                ),
                target_section: Some(CanvasSection::TestCases),
                priority: Priority::Medium,
                reasoning: "active QA category with zero matching test cases".to_string(),
                implementation_hint: None,
                estimated_effort: Some(Effort::Medium),
                related_requirements: Vec::new(),
                tags: vec![category.to_string()],
            });
        }
    }

    let has_negative = canvas.test_cases.iter().any(|tc| {
        tc.envelope().category.eq_ignore_ascii_case("negative")
            || NEGATIVE_PATTERNS
                .iter()
                .any(|p| tc.searchable_text().to_lowercase().contains(p))
    });
    if !has_negative {
        suggestions.push(Suggestion {
            id: String::new(),
            suggestion_type: SuggestionType::NegativeTest,
            title: "No negative test cases detected".to_string(),
            description: "Every test case appears to exercise only the happy path; none reject \
                invalid input or exercise a failure path."
                .to_string(),
            target_section: Some(CanvasSection::TestCases),
            priority: Priority::High,
            reasoning: "no test case category == negative and no Gherkin-style negative phrasing \
                was found"
                .to_string(),
            implementation_hint: Some("Add a test case asserting invalid input is rejected".to_string()),
            estimated_effort: Some(Effort::Medium),
            related_requirements: Vec::new(),
            tags: vec!["negative".to_string()],
        });
    }

    let has_edge_case = canvas
        .test_cases
        .iter()
        .any(|tc| EDGE_CASE_PATTERNS.iter().any(|p| tc.searchable_text().to_lowercase().contains(p)));
    if !has_edge_case {
        suggestions.push(Suggestion {
            id: String::new(),
            suggestion_type: SuggestionType::EdgeCase,
            title: "No boundary or edge-case test cases detected".to_string(),
            description: "No test case mentions boundary conditions such as empty, null, or \
                maximum/minimum values."
                .to_string(),
            target_section: Some(CanvasSection::TestCases),
            priority: Priority::Medium,
            reasoning: "no test case text matched any edge-case pattern".to_string(),
            implementation_hint: Some("Add a test case covering an empty or maximum-length input".to_string()),
            estimated_effort: Some(Effort::Low),
            related_requirements: Vec::new(),
            tags: vec!["edge_case".to_string()],
        });
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::canvas::*;
    use std::collections::HashMap;

    fn base_canvas() -> QACanvasDocument {
        let mut categories = HashMap::new();
        categories.insert("functional".to_string(), true);
        QACanvasDocument {
            ticket_summary: TicketSummary {
                problem: "p".into(),
                solution: "s".into(),
                context: "c".into(),
            },
            configuration_warnings: Vec::new(),
            acceptance_criteria: vec![AcceptanceCriterion {
                id: "ac-1".into(),
                title: "Login succeeds with valid credentials".into(),
                description: "d".into(),
                priority: AcPriority::Must,
                category: "functional".into(),
                testable: true,
            }],
            test_cases: Vec::new(),
            metadata: CanvasMetadata {
                ticket_id: "T-1".into(),
                qa_profile: crate::schema::qa_profile::QAProfile {
                    test_case_format: crate::schema::qa_profile::TestCaseFormat::Gherkin,
                    qa_categories: categories,
                    include_comments: true,
                    include_images: true,
                    operation_mode: None,
                },
                generated_at: chrono::Utc::now(),
                document_version: "1.0".into(),
                previous_version: None,
                ai_model: None,
                generation_time_ms: None,
                regeneration_reason: None,
                is_partial_result: None,
                word_count: None,
                assumptions: Vec::new(),
            },
        }
    }

    #[test]
    fn uncovered_must_criterion_yields_high_priority_gap() {
        let canvas = base_canvas();
        let gaps = find_gaps(&canvas);
        let ac_gap = gaps.iter().find(|s| s.suggestion_type == SuggestionType::CoverageGap
            && s.related_requirements.contains(&"ac-1".to_string()));
        assert_eq!(ac_gap.unwrap().priority, Priority::High);
    }

    #[test]
    fn no_negative_test_cases_yields_high_priority_gap() {
        let canvas = base_canvas();
        let gaps = find_gaps(&canvas);
        assert!(gaps.iter().any(|s| s.suggestion_type == SuggestionType::NegativeTest));
    }

    #[test]
    fn covered_criterion_is_not_flagged() {
        let mut canvas = base_canvas();
        canvas.test_cases.push(TestCase::placeholder("tc-1", crate::schema::qa_profile::TestCaseFormat::Gherkin));
        if let TestCase::Gherkin { body, .. } = &mut canvas.test_cases[0] {
            body.scenario = "Login succeeds with valid credentials".to_string();
        }
        let gaps = find_gaps(&canvas);
        assert!(!gaps.iter().any(|s| s.related_requirements.contains(&"ac-1".to_string())));
    }
}
