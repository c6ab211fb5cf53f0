//! Error Taxonomy → HTTP mapping. Every route handler returns `Result<_,
//! ApiError>`; `ApiError` is the one place [`CoreError`] gets turned into a
//! status code and the `{error, message, request_id, retryable, ...}`
//! envelope described in §4.8/§7.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use canvas_core::{CoreError, ErrorKind};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub request_id: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_s: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Wraps a [`CoreError`] with the request id assigned to this HTTP request,
/// so the response envelope always carries one even though `CoreError`
/// itself is request-agnostic.
#[derive(Debug)]
pub struct ApiError {
    pub core: CoreError,
    pub request_id: String,
}

impl ApiError {
    pub fn new(core: CoreError) -> Self {
        Self { core, request_id: Uuid::new_v4().to_string() }
    }

    fn status(&self) -> StatusCode {
        match self.core.kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::AuthConfig => StatusCode::UNAUTHORIZED,
            ErrorKind::ContentFilter => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::ContextLimit => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::ProviderOutage
            | ErrorKind::CircuitOpenAll
            | ErrorKind::FailoverExhausted => StatusCode::BAD_GATEWAY,
            ErrorKind::AiGeneration | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(core: CoreError) -> Self {
        Self::new(core)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = self
            .core
            .provider
            .as_ref()
            .map(|p| serde_json::json!({ "provider": p, "model": self.core.model }));
        let body = ErrorBody {
            error: format!("{:?}", self.core.kind).to_lowercase(),
            message: self.core.message,
            request_id: self.request_id,
            retryable: self.core.retryable,
            retry_after_s: self.core.retry_after_s,
            suggestions: self.core.suggestions,
            details,
        };
        (status, Json(body)).into_response()
    }
}
