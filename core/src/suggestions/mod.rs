//! Suggestion Engine — combines the four rule-based analyses with an
//! AI-authored enhancer pass, then ranks, filters, and caps the result
//! (§4.6).
//!
//! Rule-based suggestions are the foundation: they run unconditionally and
//! never fail. The AI pass only ever adds to that set; any failure there is
//! logged and swallowed. The endpoint only fails if the combined set is
//! empty after both passes ran.

pub mod clarification;
pub mod coverage;
pub mod edge_cases;
pub mod perspectives;

use std::sync::Arc;

use crate::errors::{CoreError, CoreResult, ErrorKind};
use crate::gateway::{GenerateOptions, ProviderGateway};
use crate::schema::canvas::QACanvasDocument;
use crate::schema::issue::safe_parse_value;
use crate::schema::requests::ChatMessage;
use crate::schema::suggestion::{Priority, Suggestion, SuggestionType};

/// Static relevance weight per [`SuggestionType`], used only as the
/// `type_score` term of the ranking formula when `focus_areas` is empty.
/// Ordered to match §4.6's own analysis order (coverage gaps first, then
/// clarification, edge cases, perspectives) — an Open Question the spec
/// leaves unresolved; recorded as a policy call in `DESIGN.md`.
fn type_score(suggestion_type: SuggestionType) -> f64 {
    match suggestion_type {
        SuggestionType::CoverageGap => 1.0,
        SuggestionType::NegativeTest => 0.95,
        SuggestionType::DataValidation => 0.9,
        SuggestionType::Security | SuggestionType::SecurityTest => 0.85,
        SuggestionType::ClarificationQuestion => 0.8,
        SuggestionType::FunctionalTest => 0.75,
        SuggestionType::EdgeCase => 0.7,
        SuggestionType::IntegrationTest => 0.65,
        SuggestionType::PerformanceTest => 0.6,
        SuggestionType::AccessibilityTest => 0.55,
        SuggestionType::UiVerification => 0.5,
        SuggestionType::Improvement => 0.4,
    }
}

fn canvas_text_corpus(canvas: &QACanvasDocument) -> String {
    let mut text = format!(
        "{} {} {}",
        canvas.ticket_summary.problem, canvas.ticket_summary.solution, canvas.ticket_summary.context
    );
    for ac in &canvas.acceptance_criteria {
        text.push(' ');
        text.push_str(&ac.title);
        text.push(' ');
        text.push_str(&ac.description);
    }
    for tc in &canvas.test_cases {
        text.push(' ');
        text.push_str(&tc.searchable_text());
    }
    text.to_lowercase()
}

fn tag_overlap(suggestion: &Suggestion, corpus: &str) -> f64 {
    if suggestion.tags.is_empty() {
        return 0.0;
    }
    let hits = suggestion
        .tags
        .iter()
        .filter(|t| corpus.contains(&t.to_lowercase()))
        .count();
    hits as f64 / suggestion.tags.len() as f64
}

/// `0.4*priority_score + 0.4*type_score + 0.2*tag_overlap_with_canvas_text`.
fn relevance(suggestion: &Suggestion, corpus: &str) -> f64 {
    0.4 * suggestion.priority.score()
        + 0.4 * type_score(suggestion.suggestion_type)
        + 0.2 * tag_overlap(suggestion, corpus)
}

fn assign_ids(mut suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
    for (i, s) in suggestions.iter_mut().enumerate() {
        s.id = format!("sugg-{}", i + 1);
    }
    suggestions
}

fn run_rule_based(canvas: &QACanvasDocument) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();
    suggestions.extend(coverage::find_gaps(canvas));
    suggestions.extend(clarification::find_ambiguities(canvas));
    suggestions.extend(edge_cases::find_edge_cases(canvas));
    suggestions.extend(perspectives::find_perspectives(canvas));
    suggestions
}

fn ai_system_prompt() -> &'static str {
    "You are a senior QA reviewer. Given a QA canvas document, propose exactly one additional \
     improvement suggestion that the rule-based analysis below would not have found — something \
     that requires judgment about the ticket's actual intent. Respond with a single JSON object \
     with fields: suggestion_type (one of edge_case, ui_verification, functional_test, \
     clarification_question, negative_test, performance_test, security_test, \
     accessibility_test, integration_test, data_validation, coverage_gap, improvement, \
     security), title, description, priority (high, medium, or low), reasoning, \
     implementation_hint (optional), tags (array of strings). Output only the JSON object."
}

fn ai_user_prompt(canvas: &QACanvasDocument, user_context: Option<&str>) -> String {
    let mut prompt = format!(
        "Ticket problem: {}\nSolution: {}\nAcceptance criteria: {}\nTest case count: {}\n",
        canvas.ticket_summary.problem,
        canvas.ticket_summary.solution,
        canvas
            .acceptance_criteria
            .iter()
            .map(|a| a.title.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        canvas.test_cases.len(),
    );
    if let Some(ctx) = user_context {
        prompt.push_str(&format!("\nAdditional context from the requester: {ctx}\n"));
    }
    prompt
}

/// Request one additional suggestion from the model. Never propagates an
/// error to the caller — a failure here is logged and treated as "the AI
/// pass contributed nothing this time" (§4.6's failure policy).
async fn ai_enhance(
    gateway: &Arc<ProviderGateway>,
    canvas: &QACanvasDocument,
    user_context: Option<&str>,
) -> Option<Suggestion> {
    let system = ai_system_prompt();
    let user = ai_user_prompt(canvas, user_context);
    let value = match gateway
        .generate_object_with(system, &user, &GenerateOptions::with_temperature(0.4))
        .await
    {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e.message, "AI suggestion enhancer failed");
            return None;
        }
    };
    match safe_parse_value::<Suggestion>(value) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!(error = %e, "AI suggestion enhancer returned an invalid shape");
            None
        }
    }
}

/// Options controlling suggestion generation, mirroring
/// [`crate::schema::requests::GenerateSuggestionsRequest`] minus the canvas
/// itself.
pub struct SuggestionRequest<'a> {
    pub canvas: &'a QACanvasDocument,
    pub max_suggestions: u32,
    pub focus_areas: &'a [SuggestionType],
    pub exclude_types: &'a [SuggestionType],
    pub user_context: Option<&'a str>,
    #[allow(dead_code)]
    pub conversation_history: &'a [ChatMessage],
}

/// Run the full suggestion pipeline: rule-based analysis, AI enhancement,
/// filtering, ranking, and capping to `max_suggestions`.
///
/// `max_suggestions == 0` short-circuits before the AI call is even made
/// (§8's boundary behavior) and returns an empty list.
pub async fn generate(
    gateway: Arc<ProviderGateway>,
    request: SuggestionRequest<'_>,
) -> CoreResult<Vec<Suggestion>> {
    if request.max_suggestions == 0 {
        return Ok(Vec::new());
    }

    let mut suggestions = run_rule_based(request.canvas);

    if let Some(ai) = ai_enhance(&gateway, request.canvas, request.user_context).await {
        suggestions.push(ai);
    }

    if !request.exclude_types.is_empty() {
        suggestions.retain(|s| !request.exclude_types.contains(&s.suggestion_type));
    }
    if !request.focus_areas.is_empty() {
        suggestions.retain(|s| request.focus_areas.contains(&s.suggestion_type));
    }

    if suggestions.is_empty() {
        return Err(CoreError::new(
            ErrorKind::Internal,
            "neither the rule-based analysis nor the AI enhancer produced any suggestion",
        ));
    }

    let corpus = canvas_text_corpus(request.canvas);
    suggestions.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| relevance(b, &corpus).partial_cmp(&relevance(a, &corpus)).unwrap_or(std::cmp::Ordering::Equal))
    });
    suggestions.truncate(request.max_suggestions as usize);

    Ok(assign_ids(suggestions))
}

/// Idempotence law (§8): filtering the same predicate twice over is a no-op
/// the second time. Exercised directly here since [`generate`] inlines its
/// filter passes rather than exposing a standalone `filter` function.
#[allow(dead_code)]
fn filter_by_type(suggestions: &[Suggestion], keep: &[SuggestionType]) -> Vec<Suggestion> {
    suggestions
        .iter()
        .filter(|s| keep.contains(&s.suggestion_type))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::canvas::*;
    use crate::schema::suggestion::Effort;
    use std::collections::HashMap;

    fn base_canvas() -> QACanvasDocument {
        let mut categories = HashMap::new();
        categories.insert("functional".to_string(), true);
        categories.insert("negative".to_string(), true);
        QACanvasDocument {
            ticket_summary: TicketSummary {
                problem: "Users cannot submit the checkout form when the cart total is zero"
                    .into(),
                solution: "Validate the cart total server-side before allowing submission".into(),
                context: "Checkout flow".into(),
            },
            configuration_warnings: Vec::new(),
            acceptance_criteria: vec![AcceptanceCriterion {
                id: "ac-1".into(),
                title: "Checkout form rejects a zero-total cart".into(),
                description: "The form must be rejected".into(),
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

    fn sample_suggestion(t: SuggestionType, priority: Priority, tags: Vec<&str>) -> Suggestion {
        Suggestion {
            id: String::new(),
            suggestion_type: t,
            title: "t".into(),
            description: "d".into(),
            target_section: None,
            priority,
            reasoning: "r".into(),
            implementation_hint: None,
            estimated_effort: Some(Effort::Low),
            related_requirements: Vec::new(),
            tags: tags.into_iter().map(str::to_string).collect(),
        }
    }

    #[test]
    fn filter_is_idempotent() {
        let suggestions = vec![
            sample_suggestion(SuggestionType::EdgeCase, Priority::High, vec![]),
            sample_suggestion(SuggestionType::Improvement, Priority::Low, vec![]),
        ];
        let once = filter_by_type(&suggestions, &[SuggestionType::EdgeCase]);
        let twice = filter_by_type(&once, &[SuggestionType::EdgeCase]);
        assert_eq!(once.len(), twice.len());
        assert_eq!(once[0].suggestion_type, twice[0].suggestion_type);
    }

    #[test]
    fn relevance_rewards_higher_priority() {
        let corpus = "checkout zero total";
        let high = sample_suggestion(SuggestionType::CoverageGap, Priority::High, vec![]);
        let low = sample_suggestion(SuggestionType::CoverageGap, Priority::Low, vec![]);
        assert!(relevance(&high, corpus) > relevance(&low, corpus));
    }

    #[test]
    fn relevance_rewards_tag_overlap_with_canvas_text() {
        let corpus = "checkout zero total cart";
        let matching = sample_suggestion(SuggestionType::EdgeCase, Priority::Medium, vec!["checkout"]);
        let unmatching = sample_suggestion(SuggestionType::EdgeCase, Priority::Medium, vec!["unrelated"]);
        assert!(relevance(&matching, corpus) > relevance(&unmatching, corpus));
    }

    #[tokio::test]
    async fn max_suggestions_zero_short_circuits_without_calling_the_model() {
        let config = crate::gateway::config::GatewayConfig {
            providers: vec![],
            failure_threshold: 5,
            reset_timeout: std::time::Duration::from_secs(60),
            max_retries: 0,
            initial_retry_delay: std::time::Duration::from_millis(1),
            backoff_factor: 2.0,
            disable_failover: false,
            observability_proxy: None,
            max_concurrent_model_calls: 8,
        };
        let gateway = Arc::new(ProviderGateway::new(config));
        let canvas = base_canvas();
        let result = generate(
            gateway,
            SuggestionRequest {
                canvas: &canvas,
                max_suggestions: 0,
                focus_areas: &[],
                exclude_types: &[],
                user_context: None,
                conversation_history: &[],
            },
        )
        .await
        .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn without_a_configured_provider_rule_based_suggestions_still_return() {
        let config = crate::gateway::config::GatewayConfig {
            providers: vec![],
            failure_threshold: 5,
            reset_timeout: std::time::Duration::from_secs(60),
            max_retries: 0,
            initial_retry_delay: std::time::Duration::from_millis(1),
            backoff_factor: 2.0,
            disable_failover: false,
            observability_proxy: None,
            max_concurrent_model_calls: 8,
        };
        let gateway = Arc::new(ProviderGateway::new(config));
        let canvas = base_canvas();
        let result = generate(
            gateway,
            SuggestionRequest {
                canvas: &canvas,
                max_suggestions: 10,
                focus_areas: &[],
                exclude_types: &[],
                user_context: None,
                conversation_history: &[],
            },
        )
        .await
        .unwrap();
        assert!(!result.is_empty());
        assert!(result.iter().enumerate().all(|(i, s)| s.id == format!("sugg-{}", i + 1)));
    }
}
