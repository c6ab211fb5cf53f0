//! Perspective suggestions — one or two canonical testing angles per active
//! QA category, independent of anything specific to the ticket's content
//! (§4.6). These exist so a canvas covering, say, `security` always gets at
//! least a nod toward input sanitization even if nothing else surfaced it.

use crate::schema::canvas::{CanvasSection, QACanvasDocument};
use crate::schema::suggestion::{Effort, Priority, Suggestion, SuggestionType};

struct Perspective {
    category: &'static str,
    title: &'static str,
    description: &'static str,
    suggestion_type: SuggestionType,
    effort: Effort,
}

const PERSPECTIVES: &[Perspective] = &[
    Perspective {
        category: "ui",
        title: "Visual consistency across breakpoints",
        description: "Verify layout, spacing, and alignment hold up across the supported range \
            of viewport widths.",
        suggestion_type: SuggestionType::UiVerification,
        effort: Effort::Low,
    },
    Perspective {
        category: "accessibility",
        title: "Full keyboard navigation",
        description: "Verify every interactive element is reachable and operable using only the \
            keyboard, in a sensible tab order.",
        suggestion_type: SuggestionType::AccessibilityTest,
        effort: Effort::Medium,
    },
    Perspective {
        category: "accessibility",
        title: "Screen reader labeling",
        description: "Verify interactive elements expose accessible names and roles to assistive \
            technology.",
        suggestion_type: SuggestionType::AccessibilityTest,
        effort: Effort::Medium,
    },
    Perspective {
        category: "security",
        title: "Input sanitization",
        description: "Verify user-supplied input is sanitized or escaped before it reaches \
            storage or rendering, to rule out injection.",
        suggestion_type: SuggestionType::SecurityTest,
        effort: Effort::Medium,
    },
    Perspective {
        category: "performance",
        title: "Load-time under realistic data volume",
        description: "Verify the feature performs acceptably with a realistic (not empty, not \
            trivially small) amount of data.",
        suggestion_type: SuggestionType::PerformanceTest,
        effort: Effort::Medium,
    },
    Perspective {
        category: "functional",
        title: "State persistence across navigation",
        description: "Verify state introduced by this change survives navigation away from and \
            back to the page, and survives a refresh.",
        suggestion_type: SuggestionType::FunctionalTest,
        effort: Effort::Low,
    },
    Perspective {
        category: "database",
        title: "Referential integrity under concurrent writes",
        description: "Verify related records stay consistent when multiple writes touch them \
            concurrently.",
        suggestion_type: SuggestionType::DataValidation,
        effort: Effort::High,
    },
    Perspective {
        category: "api",
        title: "Contract stability for existing consumers",
        description: "Verify the change does not alter response shape or status codes existing \
            API consumers depend on.",
        suggestion_type: SuggestionType::IntegrationTest,
        effort: Effort::Medium,
    },
    Perspective {
        category: "mobile",
        title: "Touch target sizing",
        description: "Verify interactive elements remain comfortably tappable on a small touch \
            screen.",
        suggestion_type: SuggestionType::UiVerification,
        effort: Effort::Low,
    },
    Perspective {
        category: "ux",
        title: "Error recovery path",
        description: "Verify the user has a clear, discoverable way to recover after an error is \
            shown.",
        suggestion_type: SuggestionType::Improvement,
        effort: Effort::Low,
    },
];

/// One [`Suggestion`] per canonical perspective whose category is active on
/// the canvas's QA profile.
pub fn find_perspectives(canvas: &QACanvasDocument) -> Vec<Suggestion> {
    PERSPECTIVES
        .iter()
        .filter(|p| canvas.metadata.qa_profile.is_category_active(p.category))
        .map(|p| Suggestion {
            id: String::new(),
            suggestion_type: p.suggestion_type,
            title: p.title.to_string(),
            description: p.description.to_string(),
            target_section: Some(CanvasSection::TestCases),
            priority: Priority::Low,
            reasoning: format!("canonical perspective for the active \"{}\" category", p.category),
            implementation_hint: None,
            estimated_effort: Some(p.effort),
            related_requirements: Vec::new(),
            tags: vec![p.category.to_string(), "perspective".to_string()],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::canvas::*;
    use std::collections::HashMap;

    fn canvas_with_categories(categories: &[&str]) -> QACanvasDocument {
        let mut map = HashMap::new();
        for c in categories {
            map.insert(c.to_string(), true);
        }
        QACanvasDocument {
            ticket_summary: TicketSummary { problem: "p".into(), solution: "s".into(), context: "c".into() },
            configuration_warnings: Vec::new(),
            acceptance_criteria: Vec::new(),
            test_cases: Vec::new(),
            metadata: CanvasMetadata {
                ticket_id: "T-1".into(),
                qa_profile: crate::schema::qa_profile::QAProfile {
                    test_case_format: crate::schema::qa_profile::TestCaseFormat::Gherkin,
                    qa_categories: map,
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
    fn accessibility_category_yields_two_perspectives() {
        let canvas = canvas_with_categories(&["accessibility"]);
        let found = find_perspectives(&canvas);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|s| s.tags.contains(&"accessibility".to_string())));
    }

    #[test]
    fn inactive_category_yields_nothing() {
        let canvas = canvas_with_categories(&["functional"]);
        let found = find_perspectives(&canvas);
        assert!(found.iter().all(|s| s.tags.contains(&"functional".to_string())));
        assert!(!found.iter().any(|s| s.tags.contains(&"security".to_string())));
    }
}
