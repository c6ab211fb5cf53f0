//! Clarification analysis — rule-based suggestions flagging ambiguity in the
//! canvas's own text, independent of the Intent Engine's conversational
//! clarification generator (§4.6).

use crate::schema::canvas::{AcceptanceCriterion, CanvasSection, QACanvasDocument};
use crate::schema::suggestion::{Effort, Priority, Suggestion, SuggestionType};

const VAGUE_TERMS: &[&str] = &[
    "appropriate", "reasonable", "adequate", "quick", "fast", "several", "some", "various",
    "properly", "correctly", "efficiently",
];

const PRONOUNS: &[&str] = &["it", "this", "that", "these", "those"];

const MIN_PROBLEM_WORDS: usize = 8;
const OVERLAP_THRESHOLD: f64 = 0.3;

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn significant_words(text: &str) -> std::collections::HashSet<String> {
    words(text)
        .into_iter()
        .filter(|w| w.len() > 2 && !PRONOUNS.contains(&w.as_str()))
        .collect()
}

fn pronoun_fraction(text: &str) -> f64 {
    let all = words(text);
    if all.is_empty() {
        return 0.0;
    }
    let pronoun_count = all.iter().filter(|w| PRONOUNS.contains(&w.as_str())).count();
    pronoun_count as f64 / all.len() as f64
}

fn vague_term_suggestion(ac: &AcceptanceCriterion, term: &str) -> Suggestion {
    Suggestion {
        id: String::new(),
        suggestion_type: SuggestionType::ClarificationQuestion,
        title: format!("Vague term \"{term}\" in {}", ac.id),
        description: format!(
            "Acceptance criterion {} uses the vague term \"{term}\" without a concrete, testable \
             definition.",
            ac.id
        ),
        target_section: Some(CanvasSection::AcceptanceCriteria),
        priority: Priority::Medium,
        reasoning: "closed-list vague term detected in criterion description".to_string(),
        implementation_hint: Some(format!("Replace \"{term}\" with a measurable threshold")),
        estimated_effort: Some(Effort::Low),
        related_requirements: vec![ac.id.clone()],
        tags: vec!["clarification".to_string(), term.to_string()],
    }
}

/// Rule-based clarification suggestions: vague terminology, a thin or
/// pronoun-heavy problem statement, problem/solution keyword disconnect, and
/// criteria that share a keyword but disagree on priority.
pub fn find_ambiguities(canvas: &QACanvasDocument) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    for ac in &canvas.acceptance_criteria {
        let lower = ac.description.to_lowercase();
        for term in VAGUE_TERMS {
            if lower.split_whitespace().any(|w| w.trim_matches(|c: char| !c.is_alphanumeric()) == *term) {
                suggestions.push(vague_term_suggestion(ac, term));
            }
        }
    }

    let problem = &canvas.ticket_summary.problem;
    let problem_word_count = words(problem).len();
    if problem_word_count < MIN_PROBLEM_WORDS || pronoun_fraction(problem) > 0.2 {
        suggestions.push(Suggestion {
            id: String::new(),
            suggestion_type: SuggestionType::ClarificationQuestion,
            title: "Problem statement is thin or pronoun-heavy".to_string(),
            description: "The ticket summary's problem statement is short or leans on \
                context-free pronouns, making it harder to verify coverage against."
                .to_string(),
            target_section: Some(CanvasSection::TicketSummary),
            priority: Priority::Medium,
            reasoning: format!(
                "problem statement has {problem_word_count} word(s) (minimum {MIN_PROBLEM_WORDS})"
            ),
            implementation_hint: Some("Expand the problem statement with concrete nouns".to_string()),
            estimated_effort: Some(Effort::Low),
            related_requirements: Vec::new(),
            tags: vec!["clarification".to_string()],
        });
    }

    let problem_words = significant_words(problem);
    let solution_words = significant_words(&canvas.ticket_summary.solution);
    if !problem_words.is_empty() && !solution_words.is_empty() {
        let overlap = problem_words.intersection(&solution_words).count();
        let smaller = problem_words.len().min(solution_words.len());
        if (overlap as f64 / smaller as f64) < OVERLAP_THRESHOLD {
            suggestions.push(Suggestion {
                id: String::new(),
                suggestion_type: SuggestionType::ClarificationQuestion,
                title: "Problem and solution statements share few keywords".to_string(),
                description: "The ticket's problem and solution descriptions overlap in fewer \
                    than 30% of their significant terms, suggesting the solution may not \
                    directly address the stated problem."
                    .to_string(),
                target_section: Some(CanvasSection::TicketSummary),
                priority: Priority::Medium,
                reasoning: format!("keyword overlap ratio was {:.2}", overlap as f64 / smaller as f64),
                implementation_hint: None,
                estimated_effort: Some(Effort::Low),
                related_requirements: Vec::new(),
                tags: vec!["clarification".to_string()],
            });
        }
    }

    for (i, a) in canvas.acceptance_criteria.iter().enumerate() {
        for b in canvas.acceptance_criteria.iter().skip(i + 1) {
            if a.priority == b.priority {
                continue;
            }
            let a_words = significant_words(&a.title);
            let b_words = significant_words(&b.title);
            if a_words.intersection(&b_words).next().is_some() {
                suggestions.push(Suggestion {
                    id: String::new(),
                    suggestion_type: SuggestionType::ClarificationQuestion,
                    title: format!("{} and {} share a keyword but disagree on priority", a.id, b.id),
                    description: format!(
                        "{} ({:?}) and {} ({:?}) appear related but carry different priorities.",
                        a.id, a.priority, b.id, b.priority
                    ),
                    target_section: Some(CanvasSection::AcceptanceCriteria),
                    priority: Priority::Low,
                    reasoning: "shared keyword across criteria with differing priority".to_string(),
                    implementation_hint: Some("Confirm the intended relative priority".to_string()),
                    estimated_effort: Some(Effort::Low),
                    related_requirements: vec![a.id.clone(), b.id.clone()],
                    tags: vec!["clarification".to_string()],
                });
            }
        }
    }

    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::canvas::*;
    use std::collections::HashMap;

    fn canvas_with_problem(problem: &str) -> QACanvasDocument {
        QACanvasDocument {
            ticket_summary: TicketSummary {
                problem: problem.to_string(),
                solution: "Update the login handler to validate credentials server-side".into(),
                context: "c".into(),
            },
            configuration_warnings: Vec::new(),
            acceptance_criteria: Vec::new(),
            test_cases: Vec::new(),
            metadata: CanvasMetadata {
                ticket_id: "T-1".into(),
                qa_profile: crate::schema::qa_profile::QAProfile {
                    test_case_format: crate::schema::qa_profile::TestCaseFormat::Gherkin,
                    qa_categories: HashMap::new(),
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
    fn short_problem_statement_is_flagged() {
        let canvas = canvas_with_problem("Login broken");
        let flags = find_ambiguities(&canvas);
        assert!(flags.iter().any(|s| s.title.contains("thin or pronoun-heavy")));
    }

    #[test]
    fn vague_term_in_criterion_is_flagged() {
        let mut canvas = canvas_with_problem(
            "Users cannot log in because the authentication service rejects valid passwords",
        );
        canvas.acceptance_criteria.push(AcceptanceCriterion {
            id: "ac-1".into(),
            title: "Fast login".into(),
            description: "The system responds in a reasonable amount of time".into(),
            priority: AcPriority::Must,
            category: "functional".into(),
            testable: true,
        });
        let flags = find_ambiguities(&canvas);
        assert!(flags.iter().any(|s| s.tags.contains(&"reasonable".to_string())));
    }
}
