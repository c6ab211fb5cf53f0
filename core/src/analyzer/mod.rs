//! Canvas Analyzer — turns a [`GenerationRequest`] into a fresh
//! [`QACanvasDocument`] by fanning four independent section generations out
//! across the gateway's shared model-call semaphore and reassembling them in
//! a fixed order, regardless of which one finishes first.
//!
//! Grounded on the teacher's Map-Reduce deepthink mode: a bounded pool of
//! concurrent workers feeding into one reassembly point, except here there
//! is no reduce step proper — each of the four sections is independent and
//! none is a strategy/judge pair.

pub mod context;
pub mod prompts;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

use crate::errors::{CoreError, CoreResult};
use crate::gateway::{GenerateOptions, ProviderGateway};
use crate::schema::canvas::{
    AcceptanceCriterion, CanvasMetadata, ConfigurationWarning, QACanvasDocument, TestCase,
    TicketSummary,
};
use crate::schema::issue::safe_parse_value;
use crate::schema::qa_profile::TestCaseFormat;
use crate::uncertainty;

use context::{BaseContext, GenerationRequest};

enum SectionOutcome {
    TicketSummary(Result<TicketSummary, CoreError>),
    AcceptanceCriteria(Result<Vec<AcceptanceCriterion>, CoreError>),
    TestCases(Result<Vec<TestCase>, CoreError>),
    ConfigurationWarnings(Result<Vec<ConfigurationWarning>, CoreError>),
}

async fn acquire(semaphore: &Arc<Semaphore>) -> OwnedSemaphorePermit {
    semaphore
        .clone()
        .acquire_owned()
        .await
        .expect("model call semaphore is never closed")
}

async fn generate_ticket_summary(
    gateway: Arc<ProviderGateway>,
    semaphore: Arc<Semaphore>,
    ctx: BaseContext,
) -> Result<TicketSummary, CoreError> {
    let _permit = acquire(&semaphore).await;
    let (system, user) = prompts::ticket_summary_prompt(&ctx);
    let value = gateway
        .generate_object_with(&system, &user, &GenerateOptions::with_temperature(0.1))
        .await?;
    safe_parse_value(value).map_err(|e| {
        CoreError::new(
            crate::errors::ErrorKind::AiGeneration,
            format!("ticket_summary failed schema validation: {e}"),
        )
    })
}

async fn generate_acceptance_criteria(
    gateway: Arc<ProviderGateway>,
    semaphore: Arc<Semaphore>,
    ctx: BaseContext,
) -> Result<Vec<AcceptanceCriterion>, CoreError> {
    let _permit = acquire(&semaphore).await;
    let (system, user) = prompts::acceptance_criteria_prompt(&ctx);
    let value = gateway
        .generate_object_with(&system, &user, &GenerateOptions::with_temperature(0.2))
        .await?;
    serde_json::from_value(value).map_err(|e| {
        CoreError::new(
            crate::errors::ErrorKind::AiGeneration,
            format!("acceptance_criteria response did not match the expected shape: {e}"),
        )
    })
}

async fn generate_test_cases(
    gateway: Arc<ProviderGateway>,
    semaphore: Arc<Semaphore>,
    ctx: BaseContext,
) -> Result<Vec<TestCase>, CoreError> {
    let _permit = acquire(&semaphore).await;
    let (system, user) = prompts::test_cases_prompt(&ctx);
    let value = gateway
        .generate_object_with(&system, &user, &GenerateOptions::with_temperature(0.3))
        .await?;
    serde_json::from_value(value).map_err(|e| {
        CoreError::new(
            crate::errors::ErrorKind::AiGeneration,
            format!("test_cases response did not match the expected shape: {e}"),
        )
    })
}

async fn generate_configuration_warnings(
    gateway: Arc<ProviderGateway>,
    semaphore: Arc<Semaphore>,
    ctx: BaseContext,
) -> Result<Vec<ConfigurationWarning>, CoreError> {
    let _permit = acquire(&semaphore).await;
    let (system, user) = prompts::configuration_warnings_prompt(&ctx);
    let value = gateway
        .generate_object_with(&system, &user, &GenerateOptions::with_temperature(0.1))
        .await?;
    serde_json::from_value(value).map_err(|e| {
        CoreError::new(
            crate::errors::ErrorKind::AiGeneration,
            format!("configuration_warnings response did not match the expected shape: {e}"),
        )
    })
}

/// Assign deterministic `ac-N` ids by position, overwriting whatever (or
/// nothing) the model returned — per §4.3, ids are never model-authored.
fn assign_ac_ids(mut items: Vec<AcceptanceCriterion>) -> Vec<AcceptanceCriterion> {
    for (i, item) in items.iter_mut().enumerate() {
        item.id = format!("ac-{}", i + 1);
    }
    items
}

fn assign_tc_ids(items: Vec<TestCase>) -> Vec<TestCase> {
    items
        .into_iter()
        .enumerate()
        .map(|(i, tc)| retag_test_case_id(tc, format!("tc-{}", i + 1)))
        .collect()
}

fn retag_test_case_id(tc: TestCase, id: String) -> TestCase {
    match tc {
        TestCase::Gherkin { mut envelope, body } => {
            envelope.id = id;
            TestCase::Gherkin { envelope, body }
        }
        TestCase::Steps { mut envelope, body } => {
            envelope.id = id;
            TestCase::Steps { envelope, body }
        }
        TestCase::Table { mut envelope, body } => {
            envelope.id = id;
            TestCase::Table { envelope, body }
        }
    }
}

/// Run the four section generations concurrently and reassemble a complete
/// [`QACanvasDocument`]. Never returns `Err` for an individual section
/// failure — each section degrades to a placeholder plus a warning instead,
/// so even total AI failure still yields a valid, reviewable document.
pub async fn analyze(request: &GenerationRequest) -> CoreResult<QACanvasDocument> {
    let ctx = request.base_context();
    let semaphore = request.gateway.model_call_semaphore();
    let started = Instant::now();

    // §8 boundary behavior: an empty-string summary or description is not a
    // schema validation failure (the ticket may legitimately arrive that
    // way from the scraper) but it does guarantee a degraded, partial
    // canvas rather than letting the model paper over missing input.
    let empty_ticket_fields =
        request.ticket.summary.trim().is_empty() || request.ticket.description.trim().is_empty();

    let mut tasks: JoinSet<SectionOutcome> = JoinSet::new();

    {
        let gateway = request.gateway.clone();
        let semaphore = semaphore.clone();
        let ctx = ctx.clone();
        tasks.spawn(async move {
            SectionOutcome::TicketSummary(generate_ticket_summary(gateway, semaphore, ctx).await)
        });
    }
    {
        let gateway = request.gateway.clone();
        let semaphore = semaphore.clone();
        let ctx = ctx.clone();
        tasks.spawn(async move {
            SectionOutcome::AcceptanceCriteria(
                generate_acceptance_criteria(gateway, semaphore, ctx).await,
            )
        });
    }
    {
        let gateway = request.gateway.clone();
        let semaphore = semaphore.clone();
        let ctx = ctx.clone();
        tasks.spawn(async move {
            SectionOutcome::TestCases(generate_test_cases(gateway, semaphore, ctx).await)
        });
    }
    {
        let gateway = request.gateway.clone();
        let semaphore = semaphore.clone();
        let ctx = ctx.clone();
        tasks.spawn(async move {
            SectionOutcome::ConfigurationWarnings(
                generate_configuration_warnings(gateway, semaphore, ctx).await,
            )
        });
    }

    let mut ticket_summary_res: Option<Result<TicketSummary, CoreError>> = None;
    let mut ac_res: Option<Result<Vec<AcceptanceCriterion>, CoreError>> = None;
    let mut tc_res: Option<Result<Vec<TestCase>, CoreError>> = None;
    let mut warn_res: Option<Result<Vec<ConfigurationWarning>, CoreError>> = None;

    // Completion order is unspecified; each branch tags its own slot so
    // reassembly below is always in the fixed section order.
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(SectionOutcome::TicketSummary(r)) => ticket_summary_res = Some(r),
            Ok(SectionOutcome::AcceptanceCriteria(r)) => ac_res = Some(r),
            Ok(SectionOutcome::TestCases(r)) => tc_res = Some(r),
            Ok(SectionOutcome::ConfigurationWarnings(r)) => warn_res = Some(r),
            Err(_join_err) => {
                // The task panicked; its slot stays `None` and is treated as
                // a failure for that section below.
            }
        }
    }

    let mut warnings: Vec<ConfigurationWarning> = Vec::new();
    let mut any_degraded = false;

    if empty_ticket_fields {
        any_degraded = true;
        warnings.push(ConfigurationWarning {
            warning_type: "empty_ticket_fields".to_string(),
            title: "Ticket summary or description is empty".to_string(),
            message: "The source ticket arrived with an empty summary and/or description; \
                generated sections are based on whatever other context was available and should \
                be treated as provisional."
                .to_string(),
            recommendation: "Confirm the ticket was scraped correctly and re-run analysis once \
                its summary/description are populated."
                .to_string(),
            severity: crate::schema::canvas::Severity::High,
        });
    }

    if !request.profile.has_active_category() {
        warnings.push(ConfigurationWarning {
            warning_type: "no_active_qa_category".to_string(),
            title: "No QA category is enabled".to_string(),
            message: "The QA profile has every category disabled; acceptance criteria and test \
                cases were generated without a specific category lens."
                .to_string(),
            recommendation: "Enable at least one QA category before analyzing the ticket."
                .to_string(),
            severity: crate::schema::canvas::Severity::Medium,
        });
    }

    let ticket_summary = match ticket_summary_res {
        Some(Ok(ts)) => ts,
        Some(Err(e)) => {
            any_degraded = true;
            warnings.push(ConfigurationWarning::degradation("ticket_summary", &e.message));
            TicketSummary {
                problem: "[Degraded] Ticket summary generation unavailable".to_string(),
                solution: "A reviewer must author this section manually.".to_string(),
                context: request.ticket.summary.clone(),
            }
        }
        None => {
            any_degraded = true;
            warnings.push(ConfigurationWarning::degradation(
                "ticket_summary",
                "generation task did not complete",
            ));
            TicketSummary {
                problem: "[Degraded] Ticket summary generation unavailable".to_string(),
                solution: "A reviewer must author this section manually.".to_string(),
                context: request.ticket.summary.clone(),
            }
        }
    };

    let acceptance_criteria = match ac_res {
        Some(Ok(items)) => assign_ac_ids(items),
        Some(Err(e)) => {
            any_degraded = true;
            warnings.push(ConfigurationWarning::degradation("acceptance_criteria", &e.message));
            Vec::new()
        }
        None => {
            any_degraded = true;
            warnings.push(ConfigurationWarning::degradation(
                "acceptance_criteria",
                "generation task did not complete",
            ));
            Vec::new()
        }
    };

    let test_cases = match tc_res {
        Some(Ok(items)) => assign_tc_ids(items),
        Some(Err(e)) => {
            any_degraded = true;
            warnings.push(ConfigurationWarning::degradation("test_cases", &e.message));
            vec![TestCase::placeholder("tc-1", ctx.active_format)]
        }
        None => {
            any_degraded = true;
            warnings.push(ConfigurationWarning::degradation(
                "test_cases",
                "generation task did not complete",
            ));
            vec![TestCase::placeholder("tc-1", ctx.active_format)]
        }
    };

    match warn_res {
        Some(Ok(mut items)) => warnings.append(&mut items),
        Some(Err(e)) => {
            // Configuration warnings are themselves non-fatal (§4.3): a
            // failure here is just one fewer warning, not a degraded canvas.
            tracing::warn!(error = %e.message, "configuration_warnings generation failed");
        }
        None => {
            tracing::warn!("configuration_warnings generation task did not complete");
        }
    }

    let word_count = Some(word_count(&ticket_summary, &acceptance_criteria, &test_cases));

    // The profile's format is always explicit (never optional), so this
    // mainly surfaces vague-verb/conflicting-requirement assumptions drawn
    // from the ticket's own text rather than a defaulted format.
    let request_text = format!("{} {}", request.ticket.summary, request.ticket.description);
    let assumptions = uncertainty::detect_assumptions(Some(ctx.active_format), &request_text);

    let metadata = CanvasMetadata {
        ticket_id: request.ticket.issue_key.clone(),
        qa_profile: (*request.profile).clone(),
        generated_at: chrono::Utc::now(),
        document_version: "1.0".to_string(),
        previous_version: None,
        ai_model: None,
        generation_time_ms: Some(started.elapsed().as_millis() as u64),
        regeneration_reason: None,
        is_partial_result: if any_degraded { Some(true) } else { None },
        word_count,
        assumptions,
    };

    Ok(QACanvasDocument {
        ticket_summary,
        configuration_warnings: warnings,
        acceptance_criteria,
        test_cases,
        metadata,
    })
}

fn word_count(
    ticket_summary: &TicketSummary,
    acceptance_criteria: &[AcceptanceCriterion],
    test_cases: &[TestCase],
) -> u32 {
    let mut total = ticket_summary.problem.split_whitespace().count()
        + ticket_summary.solution.split_whitespace().count()
        + ticket_summary.context.split_whitespace().count();
    for ac in acceptance_criteria {
        total += ac.title.split_whitespace().count() + ac.description.split_whitespace().count();
    }
    for tc in test_cases {
        total += tc.searchable_text().split_whitespace().count();
    }
    total as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_ac_ids_is_positional_and_overwrites_model_ids() {
        let items = vec![
            AcceptanceCriterion {
                id: "whatever".into(),
                title: "a".into(),
                description: "d".into(),
                priority: crate::schema::canvas::AcPriority::Must,
                category: "functional".into(),
                testable: true,
            },
            AcceptanceCriterion {
                id: "".into(),
                title: "b".into(),
                description: "d".into(),
                priority: crate::schema::canvas::AcPriority::Should,
                category: "functional".into(),
                testable: true,
            },
        ];
        let tagged = assign_ac_ids(items);
        assert_eq!(tagged[0].id, "ac-1");
        assert_eq!(tagged[1].id, "ac-2");
    }

    #[test]
    fn assign_tc_ids_preserves_variant_while_retagging() {
        let items = vec![TestCase::placeholder("x", TestCaseFormat::Table)];
        let tagged = assign_tc_ids(items);
        assert_eq!(tagged[0].id(), "tc-1");
        assert!(matches!(tagged[0], TestCase::Table { .. }));
    }

    #[test]
    fn word_count_sums_across_sections() {
        let ts = TicketSummary {
            problem: "one two".into(),
            solution: "three".into(),
            context: "four five six".into(),
        };
        let count = word_count(&ts, &[], &[]);
        assert_eq!(count, 6);
    }
}
