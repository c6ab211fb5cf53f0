//! Intent Classification — the output of the classifier stage of the
//! Intent Engine.

use serde::{Deserialize, Serialize};

use super::canvas::CanvasSection;
use super::issue::{Issue, IssueCode, Validate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ModifyCanvas,
    ProvideInformation,
    AskClarification,
    OffTopic,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f64,
    #[serde(default)]
    pub target_sections: Vec<CanvasSection>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub reasoning: String,
    pub should_modify_canvas: bool,
    pub requires_clarification: bool,
}

impl Validate for IntentClassification {
    fn validate(&self) -> Vec<Issue> {
        let mut issues = Vec::new();
        if !(0.0..=1.0).contains(&self.confidence) {
            issues.push(Issue::new(
                "confidence",
                IssueCode::Range,
                "confidence must be in [0, 1]",
            ));
        }
        issues
    }
}
