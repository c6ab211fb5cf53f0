//! Intent Engine — classifies an `/api/update-canvas` message, detects which
//! canvas sections it targets, and dispatches it to the Regenerator, the
//! clarification/contextual generators, or the deterministic rejection
//! template (§4.4).
//!
//! `fallback` is never routed on directly: when the classifier itself fails
//! it tags the classification `Fallback` and hands back a deterministic
//! keyword-only guess (see [`classifier::ClassifyOutcome`]); [`dispatch`]
//! substitutes that guess for the literal intent before doing anything else,
//! so the rest of the pipeline only ever sees one of the four real intents.

pub mod classifier;
pub mod clarification;
pub mod contextual;
pub mod lexicon;
pub mod prompts;
pub mod rejection;
pub mod target_detector;

use std::sync::Arc;

use uuid::Uuid;

use crate::analyzer::context::GenerationRequest;
use crate::dependency;
use crate::errors::{CoreError, CoreResult, ErrorKind};
use crate::gateway::ProviderGateway;
use crate::regenerator::{self, RegenerationOptions};
use crate::schema::canvas::QACanvasDocument;
use crate::schema::intent::Intent;
use crate::schema::qa_profile::QAProfile;
use crate::schema::requests::{
    ChatMessage, ClarificationQuestion, MessageRole, UpdateCanvasRequest, UpdateCanvasResponse,
};
use crate::schema::ticket::Ticket;
use crate::session::{ConversationStore, PendingClarification};

pub struct IntentOutcome {
    pub response: UpdateCanvasResponse,
    pub session_id: String,
}

/// Build a minimal [`Ticket`] from a canvas's own `ticket_summary` when the
/// caller did not supply `original_ticket_data` — a regeneration request can
/// legally omit it once the canvas already exists, so the Regenerator still
/// needs something to build prompt context from.
fn ticket_from_canvas(canvas: &QACanvasDocument) -> Ticket {
    Ticket {
        issue_key: canvas.metadata.ticket_id.clone(),
        summary: canvas.ticket_summary.problem.clone(),
        description: canvas.ticket_summary.context.clone(),
        status: "Unknown".to_string(),
        priority: "Unknown".to_string(),
        issue_type: "Unknown".to_string(),
        assignee: None,
        reporter: "unknown".to_string(),
        comments: Vec::new(),
        attachments: Vec::new(),
        components: Vec::new(),
        custom_fields: Default::default(),
        scraped_at: chrono::Utc::now(),
    }
}

fn profile_from_canvas(canvas: &QACanvasDocument) -> QAProfile {
    canvas.metadata.qa_profile.clone()
}

fn latest_user_message(messages: &[ChatMessage]) -> Option<&ChatMessage> {
    messages.iter().rev().find(|m| m.role == MessageRole::User)
}

/// Handle one `/api/update-canvas` turn end to end: classify, detect
/// targets, dispatch, and update the session's conversation state.
pub async fn handle_update_canvas(
    gateway: Arc<ProviderGateway>,
    sessions: &ConversationStore,
    request: &UpdateCanvasRequest,
) -> CoreResult<IntentOutcome> {
    let session_id = request
        .session_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let latest = latest_user_message(&request.messages)
        .ok_or_else(|| CoreError::validation("messages must contain at least one user message"))?;
    let message = latest.content.clone();
    let history: Vec<ChatMessage> = request
        .messages
        .iter()
        .filter(|m| m.id != latest.id)
        .cloned()
        .collect();

    let outcome = classifier::classify(&gateway, &message, &history).await;
    let (effective_intent, classification) = match outcome.classification.intent {
        Intent::Fallback => match outcome.fallback_guess {
            Some(guess) => (guess.intent, guess),
            None => (Intent::AskClarification, outcome.classification),
        },
        _ => (outcome.classification.intent, outcome.classification),
    };

    sessions.with_session(&session_id, |session| {
        session.transition(effective_intent, classification.clone());
        if let Some(doc) = &request.current_document {
            session.set_last_canvas(doc.clone());
        }
    });

    let response = match effective_intent {
        Intent::ModifyCanvas => {
            dispatch_modify_canvas(&gateway, request, &message, &classification.target_sections).await?
        }
        Intent::AskClarification => dispatch_clarification(&gateway, &session_id, sessions, &message).await?,
        Intent::ProvideInformation => dispatch_information(&gateway, request, &message).await?,
        Intent::OffTopic => UpdateCanvasResponse::Rejection {
            changes_summary: rejection::reject(&message),
        },
        Intent::Fallback => unreachable!("Fallback is always resolved to a concrete intent above"),
    };

    if !matches!(effective_intent, Intent::AskClarification) {
        sessions.with_session(&session_id, |session| session.complete_turn());
    }

    Ok(IntentOutcome { response, session_id })
}

async fn dispatch_modify_canvas(
    gateway: &Arc<ProviderGateway>,
    request: &UpdateCanvasRequest,
    message: &str,
    keyword_target_hints: &[crate::schema::canvas::CanvasSection],
) -> CoreResult<UpdateCanvasResponse> {
    let current_document = request.current_document.as_ref().ok_or_else(|| {
        CoreError::validation("modifying a canvas requires current_document to be present")
    })?;

    let ticket = request
        .original_ticket_data
        .clone()
        .unwrap_or_else(|| ticket_from_canvas(current_document));
    let profile = profile_from_canvas(current_document);

    let gen_request = GenerationRequest::new(
        ticket,
        profile,
        request.messages.clone(),
        request.session_id.clone(),
        gateway.clone(),
    );

    let detection = target_detector::detect_targets(gateway, message, Some(current_document)).await;
    let mut targets = detection.sections;
    for hint in keyword_target_hints {
        if !targets.contains(hint) {
            targets.push(*hint);
        }
    }

    let dependency_analysis = dependency::analyze(&targets);

    let outcome = regenerator::regenerate(
        &gen_request,
        current_document,
        message,
        &RegenerationOptions::default(),
    )
    .await?;

    Ok(UpdateCanvasResponse::Modification {
        updated_document: outcome.document,
        changes_summary: outcome.changes_summary,
        target_sections: dependency_analysis.affected_sections,
    })
}

async fn dispatch_clarification(
    gateway: &Arc<ProviderGateway>,
    session_id: &str,
    sessions: &ConversationStore,
    message: &str,
) -> CoreResult<UpdateCanvasResponse> {
    let hints: Vec<String> = lexicon::match_sections(message)
        .into_iter()
        .map(|(s, _)| format!("{s:?}"))
        .collect();
    let questions: Vec<ClarificationQuestion> = clarification::generate(gateway, message, &hints).await?;

    sessions.with_session(session_id, |session| {
        session.set_pending_clarification(PendingClarification {
            questions: questions.clone(),
            asked_at: chrono::Utc::now(),
        });
    });

    Ok(UpdateCanvasResponse::Clarification {
        questions,
        session_id: session_id.to_string(),
        changes_summary: "No changes were made; clarification is needed first.".to_string(),
    })
}

async fn dispatch_information(
    gateway: &Arc<ProviderGateway>,
    request: &UpdateCanvasRequest,
    message: &str,
) -> CoreResult<UpdateCanvasResponse> {
    let current_document = request.current_document.as_ref().ok_or_else(|| {
        CoreError::new(
            ErrorKind::Validation,
            "answering a question about the canvas requires current_document to be present",
        )
    })?;

    let answer = contextual::respond(gateway, message, current_document).await;
    Ok(UpdateCanvasResponse::Information {
        response: answer.response,
        citations: answer.citations,
        suggested_follow_ups: answer.suggested_follow_ups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_user_message_is_found_even_behind_a_trailing_assistant_turn() {
        let messages = vec![
            ChatMessage {
                id: "1".into(),
                role: MessageRole::User,
                content: "add a test case".into(),
                created_at: None,
            },
            ChatMessage {
                id: "2".into(),
                role: MessageRole::Assistant,
                content: "done".into(),
                created_at: None,
            },
        ];
        let latest = latest_user_message(&messages).unwrap();
        assert_eq!(latest.content, "add a test case");
    }

    #[test]
    fn latest_user_message_returns_none_without_any_user_turn() {
        let messages = vec![ChatMessage {
            id: "1".into(),
            role: MessageRole::Assistant,
            content: "hello".into(),
            created_at: None,
        }];
        assert!(latest_user_message(&messages).is_none());
    }

    #[test]
    fn latest_user_message_finds_most_recent_user_turn() {
        let messages = vec![
            ChatMessage {
                id: "1".into(),
                role: MessageRole::User,
                content: "first".into(),
                created_at: None,
            },
            ChatMessage {
                id: "2".into(),
                role: MessageRole::User,
                content: "second".into(),
                created_at: None,
            },
        ];
        let latest = latest_user_message(&messages).unwrap();
        assert_eq!(latest.content, "second");
    }
}
