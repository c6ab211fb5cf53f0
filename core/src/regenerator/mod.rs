//! Canvas Regenerator — rewrites a complete [`QACanvasDocument`] in response
//! to user feedback. Never patches sections in place: every call produces a
//! brand-new document, diffed against the original afterward.
//!
//! Unlike the Analyzer, a section failure here is not degraded to a
//! placeholder — §4.5/§7 require the Regenerator to fail hard and return the
//! original canvas untouched, with a descriptive `ai_generation` error,
//! rather than silently serve a partially-regenerated document.

pub mod diff;
pub mod prompts;
pub mod reason;

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

use crate::analyzer::context::GenerationRequest;
use crate::errors::{CoreError, CoreResult, ErrorKind};
use crate::gateway::{GenerateOptions, ProviderGateway};
use crate::schema::canvas::{
    AcceptanceCriterion, CanvasMetadata, ConfigurationWarning, QACanvasDocument, TestCase,
};
use crate::schema::issue::safe_parse_value;
use crate::uncertainty;

use diff::SectionChange;

#[derive(Debug, Clone, Copy)]
pub struct RegenerationOptions {
    pub preserve_structure: bool,
}

impl Default for RegenerationOptions {
    fn default() -> Self {
        Self { preserve_structure: true }
    }
}

pub struct RegenerationOutcome {
    pub document: QACanvasDocument,
    pub changes: Vec<SectionChange>,
    pub changes_summary: String,
}

enum SectionOutcome {
    TicketSummary(Result<crate::schema::canvas::TicketSummary, CoreError>),
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

fn conversation_excerpt(request: &GenerationRequest) -> String {
    request
        .conversation
        .iter()
        .rev()
        .take(6)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .map(|m| format!("{:?}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn fail(section: &str, e: impl std::fmt::Display) -> CoreError {
    CoreError::new(
        ErrorKind::AiGeneration,
        format!("regeneration_failed: {section} regeneration failed: {e}"),
    )
}

/// Rewrite `original` using `feedback`, producing a complete new canvas plus
/// the diff against the original. Fails hard on any section error — the
/// caller is expected to surface the original error response and keep
/// serving `original` unchanged.
pub async fn regenerate(
    request: &GenerationRequest,
    original: &QACanvasDocument,
    feedback: &str,
    options: &RegenerationOptions,
) -> CoreResult<RegenerationOutcome> {
    let ctx = request.base_context();
    let semaphore = request.gateway.model_call_semaphore();
    let excerpt = conversation_excerpt(request);
    let started = Instant::now();

    let previous_ts = serde_json::to_string(&original.ticket_summary).unwrap_or_default();
    let previous_ac = serde_json::to_string(&original.acceptance_criteria).unwrap_or_default();
    let previous_tc = serde_json::to_string(&original.test_cases).unwrap_or_default();
    let previous_warn = serde_json::to_string(&original.configuration_warnings).unwrap_or_default();

    let mut tasks: JoinSet<SectionOutcome> = JoinSet::new();

    {
        let gateway = request.gateway.clone();
        let semaphore = semaphore.clone();
        let ctx = ctx.clone();
        let (system, user) =
            prompts::ticket_summary_prompt(&ctx, &previous_ts, feedback, &excerpt);
        tasks.spawn(async move {
            let _permit = acquire(&semaphore).await;
            let result = gateway
                .generate_object_with(&system, &user, &GenerateOptions::with_temperature(0.1))
                .await
                .and_then(|v| {
                    safe_parse_value(v).map_err(|e| {
                        CoreError::new(ErrorKind::AiGeneration, format!("{e}"))
                    })
                });
            SectionOutcome::TicketSummary(result)
        });
    }
    {
        let gateway = request.gateway.clone();
        let semaphore = semaphore.clone();
        let ctx = ctx.clone();
        let (system, user) =
            prompts::acceptance_criteria_prompt(&ctx, &previous_ac, feedback, &excerpt);
        tasks.spawn(async move {
            let _permit = acquire(&semaphore).await;
            let result = gateway
                .generate_object_with(&system, &user, &GenerateOptions::with_temperature(0.2))
                .await
                .and_then(|v| {
                    serde_json::from_value(v)
                        .map_err(|e| CoreError::new(ErrorKind::AiGeneration, format!("{e}")))
                });
            SectionOutcome::AcceptanceCriteria(result)
        });
    }
    {
        let gateway = request.gateway.clone();
        let semaphore = semaphore.clone();
        let ctx = ctx.clone();
        let (system, user) = prompts::test_cases_prompt(&ctx, &previous_tc, feedback, &excerpt);
        tasks.spawn(async move {
            let _permit = acquire(&semaphore).await;
            let result = gateway
                .generate_object_with(&system, &user, &GenerateOptions::with_temperature(0.3))
                .await
                .and_then(|v| {
                    serde_json::from_value(v)
                        .map_err(|e| CoreError::new(ErrorKind::AiGeneration, format!("{e}")))
                });
            SectionOutcome::TestCases(result)
        });
    }
    {
        let gateway = request.gateway.clone();
        let semaphore = semaphore.clone();
        let (system, user) = prompts::configuration_warnings_prompt(&ctx, &previous_warn, feedback);
        tasks.spawn(async move {
            let _permit = acquire(&semaphore).await;
            let result = gateway
                .generate_object_with(&system, &user, &GenerateOptions::with_temperature(0.1))
                .await
                .and_then(|v| {
                    serde_json::from_value(v)
                        .map_err(|e| CoreError::new(ErrorKind::AiGeneration, format!("{e}")))
                });
            SectionOutcome::ConfigurationWarnings(result)
        });
    }

    let mut ticket_summary_res = None;
    let mut ac_res = None;
    let mut tc_res = None;
    let mut warn_res = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(SectionOutcome::TicketSummary(r)) => ticket_summary_res = Some(r),
            Ok(SectionOutcome::AcceptanceCriteria(r)) => ac_res = Some(r),
            Ok(SectionOutcome::TestCases(r)) => tc_res = Some(r),
            Ok(SectionOutcome::ConfigurationWarnings(r)) => warn_res = Some(r),
            Err(join_err) => return Err(fail("a section", join_err)),
        }
    }

    let ticket_summary = ticket_summary_res
        .ok_or_else(|| fail("ticket_summary", "task did not complete"))?
        .map_err(|e| fail("ticket_summary", e.message))?;
    let ac_items = ac_res
        .ok_or_else(|| fail("acceptance_criteria", "task did not complete"))?
        .map_err(|e| fail("acceptance_criteria", e.message))?;
    let tc_items = tc_res
        .ok_or_else(|| fail("test_cases", "task did not complete"))?
        .map_err(|e| fail("test_cases", e.message))?;
    let warnings = warn_res
        .ok_or_else(|| fail("configuration_warnings", "task did not complete"))?
        .map_err(|e| fail("configuration_warnings", e.message))?;

    let acceptance_criteria = carry_ac_ids(ac_items, &original.acceptance_criteria, options.preserve_structure);
    let test_cases = carry_tc_ids(tc_items, &original.test_cases, options.preserve_structure);

    let major = reason::is_major_revision_request(feedback);
    let document_version = bump_version(&original.metadata.document_version, major);
    let regeneration_reason = reason::derive_regeneration_reason(feedback);

    let word_count = Some(word_count(&ticket_summary, &acceptance_criteria, &test_cases));
    let assumptions = uncertainty::detect_assumptions(Some(ctx.active_format), feedback);

    let metadata = CanvasMetadata {
        ticket_id: original.metadata.ticket_id.clone(),
        qa_profile: original.metadata.qa_profile.clone(),
        generated_at: chrono::Utc::now(),
        document_version,
        previous_version: Some(original.metadata.document_version.clone()),
        ai_model: original.metadata.ai_model.clone(),
        generation_time_ms: Some(started.elapsed().as_millis() as u64),
        regeneration_reason: Some(regeneration_reason),
        is_partial_result: None,
        word_count,
        assumptions,
    };

    let new_document = QACanvasDocument {
        ticket_summary,
        configuration_warnings: warnings,
        acceptance_criteria,
        test_cases,
        metadata,
    };

    let changes = diff::compute_diff(original, &new_document);
    let changes_summary = diff::summarize(&changes);

    Ok(RegenerationOutcome {
        document: new_document,
        changes,
        changes_summary,
    })
}

/// Carry IDs from `old` onto `new` by position when `preserve_structure` is
/// set and a positional correspondence exists; items beyond the original
/// length get freshly assigned ids, same as a first-time analysis.
fn carry_ac_ids(
    new: Vec<AcceptanceCriterion>,
    old: &[AcceptanceCriterion],
    preserve_structure: bool,
) -> Vec<AcceptanceCriterion> {
    new.into_iter()
        .enumerate()
        .map(|(i, mut item)| {
            item.id = if preserve_structure {
                old.get(i).map(|o| o.id.clone()).unwrap_or_else(|| format!("ac-{}", i + 1))
            } else {
                format!("ac-{}", i + 1)
            };
            item
        })
        .collect()
}

fn carry_tc_ids(new: Vec<TestCase>, old: &[TestCase], preserve_structure: bool) -> Vec<TestCase> {
    new.into_iter()
        .enumerate()
        .map(|(i, tc)| {
            let id = if preserve_structure {
                old.get(i).map(|o| o.id().to_string()).unwrap_or_else(|| format!("tc-{}", i + 1))
            } else {
                format!("tc-{}", i + 1)
            };
            retag_test_case_id(tc, id)
        })
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

/// `document_version` is a `major.minor` string; bump minor by 0.1 unless a
/// major revision was requested, in which case bump the major integer and
/// reset minor to 0.
fn bump_version(previous: &str, major_revision: bool) -> String {
    let (major, minor) = previous
        .split_once('.')
        .and_then(|(a, b)| Some((a.parse::<u32>().ok()?, b.parse::<u32>().ok()?)))
        .unwrap_or((1, 0));

    if major_revision {
        format!("{}.0", major + 1)
    } else {
        format!("{major}.{}", minor + 1)
    }
}

fn word_count(
    ticket_summary: &crate::schema::canvas::TicketSummary,
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
    fn bump_version_increments_minor_by_default() {
        assert_eq!(bump_version("1.0", false), "1.1");
        assert_eq!(bump_version("1.9", false), "1.10");
    }

    #[test]
    fn bump_version_increments_major_on_request() {
        assert_eq!(bump_version("1.4", true), "2.0");
    }

    #[test]
    fn bump_version_defaults_when_unparseable() {
        assert_eq!(bump_version("garbage", false), "1.1");
    }

    #[test]
    fn carry_ac_ids_reuses_positional_originals() {
        let old = vec![AcceptanceCriterion {
            id: "ac-7".into(),
            title: "old".into(),
            description: "d".into(),
            priority: crate::schema::canvas::AcPriority::Must,
            category: "functional".into(),
            testable: true,
        }];
        let new = vec![AcceptanceCriterion {
            id: "whatever".into(),
            title: "new".into(),
            description: "d".into(),
            priority: crate::schema::canvas::AcPriority::Must,
            category: "functional".into(),
            testable: true,
        }];
        let carried = carry_ac_ids(new, &old, true);
        assert_eq!(carried[0].id, "ac-7");
    }

    #[test]
    fn carry_ac_ids_assigns_fresh_id_beyond_original_length() {
        let new = vec![AcceptanceCriterion {
            id: "x".into(),
            title: "new".into(),
            description: "d".into(),
            priority: crate::schema::canvas::AcPriority::Must,
            category: "functional".into(),
            testable: true,
        }];
        let carried = carry_ac_ids(new, &[], true);
        assert_eq!(carried[0].id, "ac-1");
    }

    #[test]
    fn carry_ac_ids_ignores_originals_when_preserve_structure_is_false() {
        let old = vec![AcceptanceCriterion {
            id: "ac-7".into(),
            title: "old".into(),
            description: "d".into(),
            priority: crate::schema::canvas::AcPriority::Must,
            category: "functional".into(),
            testable: true,
        }];
        let new = vec![AcceptanceCriterion {
            id: "x".into(),
            title: "new".into(),
            description: "d".into(),
            priority: crate::schema::canvas::AcPriority::Must,
            category: "functional".into(),
            testable: true,
        }];
        let carried = carry_ac_ids(new, &old, false);
        assert_eq!(carried[0].id, "ac-1");
    }
}
