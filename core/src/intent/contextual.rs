//! Contextual response generation — answers `provide_information` messages
//! against the current canvas without modifying it.

use serde::Deserialize;

use crate::gateway::ProviderGateway;
use crate::schema::canvas::QACanvasDocument;
use crate::uncertainty;

use super::prompts;

#[derive(Debug, Clone, Deserialize)]
pub struct ContextualResponse {
    pub response: String,
    #[serde(default)]
    pub citations: Vec<String>,
    #[serde(default)]
    pub suggested_follow_ups: Vec<String>,
}

impl ContextualResponse {
    fn degraded() -> Self {
        Self {
            response: "I wasn't able to generate an answer right now. The canvas itself is \
                unaffected; please try rephrasing your question."
                .to_string(),
            citations: Vec::new(),
            suggested_follow_ups: Vec::new(),
        }
    }
}

/// Answer an informational question about `canvas`. Degrades to a generic
/// apology rather than failing the turn when the gateway call fails.
pub async fn respond(
    gateway: &ProviderGateway,
    message: &str,
    canvas: &QACanvasDocument,
) -> ContextualResponse {
    let (system, user) = prompts::contextual_response_prompt(message, canvas);
    let response = match gateway.generate_object(&system, &user).await {
        Ok(value) => serde_json::from_value(value).unwrap_or_else(|_| ContextualResponse::degraded()),
        Err(_) => ContextualResponse::degraded(),
    };

    let report = uncertainty::detect_uncertainty(&response.response);
    if report.uncertain {
        tracing::debug!(
            confidence_score = report.confidence_score,
            indicators = ?report.indicators,
            "contextual response carries hedging language"
        );
    }

    response
}
