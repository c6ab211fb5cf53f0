//! Clarification generation — produces the questions shown to the user when
//! the classifier (or the decisiveness rule) lands on `ask_clarification`.

use crate::errors::CoreResult;
use crate::gateway::ProviderGateway;
use crate::schema::requests::ClarificationQuestion;

use super::prompts;

/// Generate 1-4 clarifying questions for an ambiguous modification request.
/// Falls back to a single generic question if the gateway call fails, or if
/// the model's response doesn't parse — clarification is itself the
/// fallback path, so it must not fail the whole turn even when degraded.
pub async fn generate(
    gateway: &ProviderGateway,
    message: &str,
    target_section_hints: &[String],
) -> CoreResult<Vec<ClarificationQuestion>> {
    let (system, user) = prompts::clarification_prompt(message, target_section_hints);

    let questions = match gateway.generate_object(&system, &user).await {
        Ok(value) => serde_json::from_value::<Vec<ClarificationQuestion>>(value)
            .ok()
            .filter(|qs| !qs.is_empty()),
        Err(_) => None,
    };

    Ok(questions.unwrap_or_else(|| vec![fallback_question()]))
}

fn fallback_question() -> ClarificationQuestion {
    ClarificationQuestion {
        question: "Could you say more specifically what you'd like changed, and in which section?"
            .to_string(),
        category: "general".to_string(),
        target_section: None,
        priority: crate::schema::suggestion::Priority::Medium,
    }
}
