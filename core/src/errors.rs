//! Error taxonomy shared by every subsystem.
//!
//! Every internal component that can fail returns a [`CoreError`] (or wraps
//! one). The HTTP surface (`crates/service`) maps `CoreError` onto the
//! stable response envelope described by the error taxonomy: `{error,
//! message, request_id, retryable, retry_after_s?, suggestions[]}`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error kind. Mirrors the closed set from the taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    AiGeneration,
    RateLimited,
    ContextLimit,
    AuthConfig,
    Timeout,
    ContentFilter,
    ProviderOutage,
    CircuitOpenAll,
    FailoverExhausted,
    NotFound,
    Internal,
}

impl ErrorKind {
    /// Whether errors of this kind are safe to retry without caller changes.
    pub fn default_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimited
                | ErrorKind::Timeout
                | ErrorKind::ProviderOutage
                | ErrorKind::FailoverExhausted
        )
    }
}

/// The primary error type threaded through every subsystem in this crate.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct CoreError {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_s: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl CoreError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let retryable = kind.default_retryable();
        Self {
            kind,
            message: message.into(),
            retryable,
            retry_after_s: None,
            provider: None,
            model: None,
            suggestions: Vec::new(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after_s = Some(seconds);
        self.retryable = true;
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn non_retryable(mut self) -> Self {
        self.retryable = false;
        self
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
