//! `POST /api/analyze-ticket` — runs the Canvas Analyzer over a fresh
//! ticket and returns a Canvas (`200`) or a partial Canvas (`206`).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use canvas_core::analyzer::{self, context::GenerationRequest};
use canvas_core::schema::requests::AnalyzeTicketRequest;
use canvas_core::schema::Validate;
use canvas_core::CoreError;

use crate::error::ApiError;
use crate::state::AppState;

pub async fn analyze_ticket(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeTicketRequest>,
) -> Result<Response, ApiError> {
    let issues = request.validate();
    if !issues.is_empty() {
        let message = issues.iter().map(|i| i.message.clone()).collect::<Vec<_>>().join("; ");
        return Err(ApiError::new(CoreError::validation(message)));
    }

    let gen_request = GenerationRequest::new(
        request.ticket_json,
        request.qa_profile,
        Vec::new(),
        None,
        Arc::clone(&state.gateway),
    );

    let canvas = analyzer::analyze(&gen_request).await?;

    let status = if canvas.metadata.is_partial_result == Some(true) {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    Ok((status, Json(canvas)).into_response())
}
