//! `POST /api/update-canvas` — the Intent Engine's single entry point.
//! Clarification and information responses stream as SSE when the caller
//! sends `Accept: text/event-stream`; every other case (and every other
//! response shape) is plain JSON, since modification/rejection responses
//! carry a whole document that doesn't benefit from chunking.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use canvas_core::intent::{self};
use canvas_core::schema::requests::{UpdateCanvasRequest, UpdateCanvasResponse};
use canvas_core::schema::Validate;
use canvas_core::CoreError;

use crate::error::ApiError;
use crate::sse::{clarification_chunks, information_chunks, sse_response};
use crate::state::AppState;

fn wants_sse(headers: &HeaderMap) -> bool {
    headers
        .get(axum::http::header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/event-stream"))
        .unwrap_or(false)
}

pub async fn update_canvas(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<UpdateCanvasRequest>,
) -> Result<Response, ApiError> {
    let issues = request.validate();
    if !issues.is_empty() {
        let message = issues.iter().map(|i| i.message.clone()).collect::<Vec<_>>().join("; ");
        return Err(ApiError::new(CoreError::validation(message)));
    }

    let outcome = intent::handle_update_canvas(state.gateway.clone(), &state.sessions, &request).await?;
    let streaming = wants_sse(&headers);

    let response = match (outcome.response, streaming) {
        (UpdateCanvasResponse::Clarification { questions, session_id: _, changes_summary }, true) => {
            sse_response(clarification_chunks(&questions, &changes_summary)).into_response()
        }
        (resp @ UpdateCanvasResponse::Clarification { .. }, false) => {
            (StatusCode::OK, Json(resp)).into_response()
        }
        (UpdateCanvasResponse::Information { response, citations, suggested_follow_ups }, true) => {
            sse_response(information_chunks(&response, &citations, &suggested_follow_ups)).into_response()
        }
        (resp @ UpdateCanvasResponse::Information { .. }, false) => {
            (StatusCode::OK, Json(resp)).into_response()
        }
        (resp, _) => (StatusCode::OK, Json(resp)).into_response(),
    };

    Ok(response)
}
