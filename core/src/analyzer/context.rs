//! The shared base context every one of the analyzer's four section prompts
//! is built from, plus the immutable [`GenerationRequest`] envelope threaded
//! through the whole pipeline instead of ad hoc arguments or hidden globals
//! (§9's "context objects" redesign note).

use std::sync::Arc;

use crate::gateway::ProviderGateway;
use crate::schema::qa_profile::QAProfile;
use crate::schema::ticket::Ticket;

const MAX_COMMENT_BODY_CHARS: usize = 500;
const MAX_CUSTOM_FIELDS: usize = 8;

/// A trimmed, prompt-sized view of the ticket and profile, built once and
/// shared read-only across the four parallel section generations.
#[derive(Debug, Clone)]
pub struct BaseContext {
    pub issue_key: String,
    pub summary: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub issue_type: String,
    pub components: Vec<String>,
    pub recent_comments: Vec<String>,
    pub custom_fields_head: Vec<(String, String)>,
    pub active_categories: Vec<String>,
    pub active_format: crate::schema::qa_profile::TestCaseFormat,
}

impl BaseContext {
    pub fn build(ticket: &Ticket, profile: &QAProfile) -> Self {
        let recent_comments = if profile.include_comments {
            ticket
                .recent_comments_trimmed(MAX_COMMENT_BODY_CHARS)
                .into_iter()
                .map(|c| format!("{}: {}", c.author, c.body))
                .collect()
        } else {
            Vec::new()
        };

        let mut custom_fields_head: Vec<(String, String)> = ticket
            .custom_fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        custom_fields_head.sort_by(|a, b| a.0.cmp(&b.0));
        custom_fields_head.truncate(MAX_CUSTOM_FIELDS);

        Self {
            issue_key: ticket.issue_key.clone(),
            summary: ticket.summary.clone(),
            description: ticket.description.clone(),
            status: ticket.status.clone(),
            priority: ticket.priority.clone(),
            issue_type: ticket.issue_type.clone(),
            components: ticket.components.clone(),
            recent_comments,
            custom_fields_head,
            active_categories: profile.active_categories().into_iter().map(str::to_string).collect(),
            active_format: profile.test_case_format,
        }
    }

    /// Render as a single prompt-ready block shared verbatim across every
    /// section's user prompt.
    pub fn render(&self) -> String {
        let mut out = format!(
            "Ticket {key}: {summary}\n\
             Type: {issue_type} | Status: {status} | Priority: {priority}\n\
             Components: {components}\n\n\
             Description:\n{description}\n",
            key = self.issue_key,
            summary = self.summary,
            issue_type = self.issue_type,
            status = self.status,
            priority = self.priority,
            components = if self.components.is_empty() {
                "(none)".to_string()
            } else {
                self.components.join(", ")
            },
            description = self.description,
        );

        if !self.recent_comments.is_empty() {
            out.push_str("\nRecent comments:\n");
            for comment in &self.recent_comments {
                out.push_str("- ");
                out.push_str(comment);
                out.push('\n');
            }
        }

        if !self.custom_fields_head.is_empty() {
            out.push_str("\nCustom fields:\n");
            for (k, v) in &self.custom_fields_head {
                out.push_str(&format!("- {k}: {v}\n"));
            }
        }

        out.push_str(&format!(
            "\nActive QA categories: {}\nTest case format: {:?}\n",
            if self.active_categories.is_empty() {
                "(none configured)".to_string()
            } else {
                self.active_categories.join(", ")
            },
            self.active_format,
        ));

        out
    }
}

/// The immutable per-request envelope carried through analyzer, intent
/// engine, suggestion engine, and regenerator pipelines: ticket, profile,
/// conversation window, session id, and an injected gateway handle. No
/// subsystem reaches for a hidden global — everything it needs arrives here.
#[derive(Clone)]
pub struct GenerationRequest {
    pub ticket: Arc<Ticket>,
    pub profile: Arc<QAProfile>,
    pub conversation: Arc<Vec<crate::schema::requests::ChatMessage>>,
    pub session_id: Option<String>,
    pub gateway: Arc<ProviderGateway>,
}

impl GenerationRequest {
    pub fn new(
        ticket: Ticket,
        profile: QAProfile,
        conversation: Vec<crate::schema::requests::ChatMessage>,
        session_id: Option<String>,
        gateway: Arc<ProviderGateway>,
    ) -> Self {
        Self {
            ticket: Arc::new(ticket),
            profile: Arc::new(profile),
            conversation: Arc::new(conversation),
            session_id,
            gateway,
        }
    }

    pub fn base_context(&self) -> BaseContext {
        BaseContext::build(&self.ticket, &self.profile)
    }
}
