//! Ticket — immutable input from the (external) issue-tracker scraper.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::issue::{require_non_empty, Issue, IssueCode, Validate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketComment {
    pub author: String,
    pub body: String,
    /// Kept as the raw scraper-provided date string; the scraper's date
    /// format is external and not standardized on ingest.
    pub date: String,
    #[serde(default)]
    pub image_refs: Vec<String>,
    #[serde(default)]
    pub link_refs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketAttachment {
    #[serde(default)]
    pub payload: Vec<u8>,
    pub mime: String,
    pub size: u64,
    #[serde(default)]
    pub too_big: bool,
}

/// Immutable ticket input. Unknown fields are ignored — this struct is
/// deserialized from data produced by an external scraper this service does
/// not control the schema evolution of.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub issue_key: String,
    pub summary: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub issue_type: String,
    #[serde(default)]
    pub assignee: Option<String>,
    pub reporter: String,
    #[serde(default)]
    pub comments: Vec<TicketComment>,
    #[serde(default)]
    pub attachments: Vec<TicketAttachment>,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub custom_fields: HashMap<String, serde_json::Value>,
    pub scraped_at: DateTime<Utc>,
}

impl Ticket {
    /// Last three comments, each body truncated to `max_body_chars`. Used to
    /// build the analyzer's shared base context without unbounded growth.
    pub fn recent_comments_trimmed(&self, max_body_chars: usize) -> Vec<TicketComment> {
        self.comments
            .iter()
            .rev()
            .take(3)
            .map(|c| {
                let mut c = c.clone();
                if c.body.len() > max_body_chars {
                    c.body.truncate(max_body_chars);
                    c.body.push('…');
                }
                c
            })
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }
}

impl Validate for Ticket {
    fn validate(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        if let Some(i) = require_non_empty("issue_key", &self.issue_key) {
            issues.push(i);
        }
        if let Some(i) = require_non_empty("reporter", &self.reporter) {
            issues.push(i);
        }
        // summary/description may legitimately be empty (boundary behavior:
        // empty-string ticket fields degrade to a warning, they are not a
        // hard validation failure at the schema layer).
        for (idx, attachment) in self.attachments.iter().enumerate() {
            if attachment.mime.trim().is_empty() {
                issues.push(Issue::new(
                    format!("attachments[{idx}].mime"),
                    IssueCode::InvalidString,
                    "mime must not be empty",
                ));
            }
        }
        issues
    }
}
