//! Request/response boundary shapes for the three HTTP endpoints.
//!
//! These live in `canvas_core` (not `crates/service`) because the Schema
//! Layer is the single source of truth for every network boundary, and the
//! Intent Engine / Analyzer / Suggestion Engine validate against these same
//! types rather than a transport-owned duplicate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::canvas::{CanvasSection, QACanvasDocument};
use super::issue::{Issue, Validate};
use super::qa_profile::QAProfile;
use super::suggestion::Suggestion;
use super::ticket::Ticket;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeTicketRequest {
    pub qa_profile: QAProfile,
    pub ticket_json: Ticket,
}

impl Validate for AnalyzeTicketRequest {
    fn validate(&self) -> Vec<Issue> {
        let mut issues = self.qa_profile.validate();
        issues.extend(self.ticket_json.validate());
        issues
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCanvasRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub current_document: Option<QACanvasDocument>,
    #[serde(default)]
    pub original_ticket_data: Option<Ticket>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl Validate for UpdateCanvasRequest {
    fn validate(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        if self.messages.is_empty() {
            issues.push(Issue::custom("messages", "messages must not be empty"));
        }
        issues
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClarificationQuestion {
    pub question: String,
    pub category: String,
    #[serde(default)]
    pub target_section: Option<CanvasSection>,
    pub priority: super::suggestion::Priority,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateCanvasResponse {
    Modification {
        updated_document: QACanvasDocument,
        changes_summary: String,
        target_sections: Vec<CanvasSection>,
    },
    Clarification {
        questions: Vec<ClarificationQuestion>,
        session_id: String,
        changes_summary: String,
    },
    Information {
        response: String,
        citations: Vec<String>,
        suggested_follow_ups: Vec<String>,
    },
    Rejection {
        changes_summary: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSuggestionsRequest {
    pub current_document: QACanvasDocument,
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: u32,
    #[serde(default)]
    pub focus_areas: Vec<super::suggestion::SuggestionType>,
    #[serde(default)]
    pub exclude_types: Vec<super::suggestion::SuggestionType>,
    #[serde(default)]
    pub user_context: Option<String>,
    #[serde(default)]
    pub conversation_history: Vec<ChatMessage>,
}

fn default_max_suggestions() -> u32 {
    10
}

impl Validate for GenerateSuggestionsRequest {
    fn validate(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        if self.max_suggestions > 10 {
            issues.push(Issue::custom(
                "max_suggestions",
                "max_suggestions must be <= 10",
            ));
        }
        issues
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
    pub total_count: usize,
    pub generated_at: DateTime<Utc>,
    pub context_summary: String,
}
