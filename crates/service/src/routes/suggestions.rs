//! `POST /api/generate-suggestions` — runs the Suggestion Engine over an
//! already-generated canvas.

use axum::extract::State;
use axum::Json;

use canvas_core::schema::requests::{GenerateSuggestionsRequest, GenerateSuggestionsResponse};
use canvas_core::schema::Validate;
use canvas_core::suggestions::{self, SuggestionRequest};
use canvas_core::CoreError;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn generate_suggestions(
    State(state): State<AppState>,
    Json(request): Json<GenerateSuggestionsRequest>,
) -> Result<Json<GenerateSuggestionsResponse>, ApiError> {
    let issues = request.validate();
    if !issues.is_empty() {
        let message = issues.iter().map(|i| i.message.clone()).collect::<Vec<_>>().join("; ");
        return Err(ApiError::new(CoreError::validation(message)));
    }

    let suggestion_request = SuggestionRequest {
        canvas: &request.current_document,
        max_suggestions: request.max_suggestions,
        focus_areas: &request.focus_areas,
        exclude_types: &request.exclude_types,
        user_context: request.user_context.as_deref(),
        conversation_history: &request.conversation_history,
    };

    let results = suggestions::generate(state.gateway.clone(), suggestion_request).await?;

    let context_summary = format!(
        "{} suggestion(s) generated against ticket {}",
        results.len(),
        request.current_document.metadata.ticket_id
    );

    Ok(Json(GenerateSuggestionsResponse {
        total_count: results.len(),
        suggestions: results,
        generated_at: chrono::Utc::now(),
        context_summary,
    }))
}
