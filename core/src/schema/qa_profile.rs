//! QAProfile — immutable per-run configuration for the analyzer/suggester.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::issue::{Issue, IssueCode, Validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCaseFormat {
    Gherkin,
    Steps,
    Table,
}

/// The closed set of QA categories a profile can enable.
pub const QA_CATEGORY_KEYS: &[&str] = &[
    "functional",
    "ui",
    "ux",
    "negative",
    "api",
    "database",
    "performance",
    "security",
    "mobile",
    "accessibility",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QAProfile {
    pub test_case_format: TestCaseFormat,
    /// Mapping from the closed category set to booleans. Categories absent
    /// from the map are treated as `false`.
    #[serde(default)]
    pub qa_categories: HashMap<String, bool>,
    #[serde(default = "default_true")]
    pub include_comments: bool,
    #[serde(default = "default_true")]
    pub include_images: bool,
    #[serde(default)]
    pub operation_mode: Option<String>,
}

fn default_true() -> bool {
    true
}

impl QAProfile {
    /// Categories that are both a recognized key and enabled.
    pub fn active_categories(&self) -> Vec<&str> {
        QA_CATEGORY_KEYS
            .iter()
            .copied()
            .filter(|k| self.qa_categories.get(*k).copied().unwrap_or(false))
            .collect()
    }

    pub fn has_active_category(&self) -> bool {
        !self.active_categories().is_empty()
    }

    pub fn is_category_active(&self, category: &str) -> bool {
        self.qa_categories.get(category).copied().unwrap_or(false)
    }
}

impl Validate for QAProfile {
    fn validate(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        for key in self.qa_categories.keys() {
            if !QA_CATEGORY_KEYS.contains(&key.as_str()) {
                issues.push(Issue::invalid_enum("qa_categories", key.clone()));
            }
        }
        issues
    }
}
