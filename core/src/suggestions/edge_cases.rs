//! Conditional edge-case suggestions — triggered by keyword families found in
//! the ticket summary or acceptance criteria, each contributing a small set
//! of canonical scenarios for that family (§4.6).

use crate::schema::canvas::{CanvasSection, QACanvasDocument};
use crate::schema::suggestion::{Effort, Priority, Suggestion, SuggestionType};

struct EdgeCaseFamily {
    keywords: &'static [&'static str],
    scenarios: &'static [(&'static str, &'static str)],
}

const FAMILIES: &[EdgeCaseFamily] = &[
    EdgeCaseFamily {
        keywords: &["input", "field", "form", "enter", "type"],
        scenarios: &[
            ("Empty input", "Submit the form or field with no value entered"),
            ("Maximum-length input", "Enter a value at or beyond the field's maximum allowed length"),
            ("Special-character input", "Enter special characters, emoji, or script fragments into the field"),
        ],
    },
    EdgeCaseFamily {
        keywords: &["save", "update", "delete", "create", "process", "transaction"],
        scenarios: &[
            ("Concurrent operation", "Two users perform the same operation on the same record at once"),
            ("Interrupted operation", "The operation is interrupted partway through (network loss, page close)"),
        ],
    },
    EdgeCaseFamily {
        keywords: &["login", "auth", "session", "permission", "role", "access"],
        scenarios: &[
            ("Session timeout", "The user's session expires mid-operation"),
            ("Permission boundary", "A user without the required role attempts the action"),
        ],
    },
    EdgeCaseFamily {
        keywords: &["mobile", "app", "device", "responsive"],
        scenarios: &[
            ("Orientation change", "The device is rotated mid-flow"),
            ("Slow network", "The action is performed under a slow or flaky network connection"),
        ],
    },
];

fn mentions_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

/// Conditional edge-case suggestions keyed off vocabulary in the ticket
/// summary and acceptance criteria, each family contributing 1-2 scenarios.
pub fn find_edge_cases(canvas: &QACanvasDocument) -> Vec<Suggestion> {
    let mut corpus = format!(
        "{} {} {}",
        canvas.ticket_summary.problem, canvas.ticket_summary.solution, canvas.ticket_summary.context
    )
    .to_lowercase();
    for ac in &canvas.acceptance_criteria {
        corpus.push(' ');
        corpus.push_str(&ac.title.to_lowercase());
        corpus.push(' ');
        corpus.push_str(&ac.description.to_lowercase());
    }

    let mut suggestions = Vec::new();
    for family in FAMILIES {
        if !mentions_any(&corpus, family.keywords) {
            continue;
        }
        for (title, description) in family.scenarios {
            suggestions.push(Suggestion {
                id: String::new(),
                suggestion_type: SuggestionType::EdgeCase,
                title: title.to_string(),
                description: description.to_string(),
                target_section: Some(CanvasSection::TestCases),
                priority: Priority::Medium,
                reasoning: format!(
                    "ticket vocabulary matched the \"{}\" edge-case family",
                    family.keywords[0]
                ),
                implementation_hint: Some(format!("Add a test case: {description}")),
                estimated_effort: Some(Effort::Low),
                related_requirements: Vec::new(),
                tags: vec!["edge_case".to_string()],
            });
        }
    }
    suggestions
}
