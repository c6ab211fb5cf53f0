//! Suggestion — a single structured improvement proposal.

use serde::{Deserialize, Serialize};

use super::canvas::CanvasSection;
use super::issue::{require_non_empty, Issue, Validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionType {
    EdgeCase,
    UiVerification,
    FunctionalTest,
    ClarificationQuestion,
    NegativeTest,
    PerformanceTest,
    SecurityTest,
    AccessibilityTest,
    IntegrationTest,
    DataValidation,
    CoverageGap,
    Improvement,
    Security,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Numeric weight used by the ranking formula (`priority_score`).
    pub fn score(self) -> f64 {
        match self {
            Priority::Low => 0.33,
            Priority::Medium => 0.66,
            Priority::High => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub suggestion_type: SuggestionType,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub target_section: Option<CanvasSection>,
    pub priority: Priority,
    pub reasoning: String,
    #[serde(default)]
    pub implementation_hint: Option<String>,
    #[serde(default)]
    pub estimated_effort: Option<Effort>,
    #[serde(default)]
    pub related_requirements: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Validate for Suggestion {
    fn validate(&self) -> Vec<Issue> {
        [
            require_non_empty("id", &self.id),
            require_non_empty("title", &self.title),
            require_non_empty("description", &self.description),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
