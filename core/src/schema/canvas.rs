//! Canvas (QACanvasDocument) — the central artifact produced by the
//! Analyzer and rewritten wholesale by the Regenerator.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::issue::{require_non_empty, Issue, IssueCode, Validate};
use super::qa_profile::QAProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSummary {
    pub problem: String,
    pub solution: String,
    pub context: String,
}

impl Validate for TicketSummary {
    fn validate(&self) -> Vec<Issue> {
        [
            require_non_empty("ticket_summary.problem", &self.problem),
            require_non_empty("ticket_summary.solution", &self.solution),
            require_non_empty("ticket_summary.context", &self.context),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationWarning {
    #[serde(rename = "type")]
    pub warning_type: String,
    pub title: String,
    pub message: String,
    pub recommendation: String,
    pub severity: Severity,
}

impl ConfigurationWarning {
    pub fn degradation(section: &str, reason: &str) -> Self {
        Self {
            warning_type: "generation_degraded".to_string(),
            title: format!("{section} generation degraded"),
            message: format!("{section} generation failed: {reason}. A placeholder was substituted."),
            recommendation: "Regenerate the canvas or review the placeholder content manually."
                .to_string(),
            severity: Severity::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcPriority {
    Must,
    Should,
    Could,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: AcPriority,
    pub category: String,
    pub testable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TcPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GherkinBody {
    pub scenario: String,
    pub given: Vec<String>,
    pub when: Vec<String>,
    pub then: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepEntry {
    pub step_number: u32,
    pub action: String,
    pub expected_result: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepsBody {
    pub title: String,
    pub objective: String,
    #[serde(default)]
    pub preconditions: Vec<String>,
    pub steps: Vec<StepEntry>,
    #[serde(default)]
    pub postconditions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableBody {
    pub title: String,
    pub description: String,
    pub expected_outcome: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The envelope fields common to every `TestCase` regardless of format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseEnvelope {
    pub id: String,
    pub category: String,
    pub priority: TcPriority,
    #[serde(default)]
    pub estimated_time: Option<String>,
}

/// A test case, tagged on `format`. Every site that reads a `TestCase` must
/// match exhaustively — there is no default/fallback arm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum TestCase {
    Gherkin {
        #[serde(flatten)]
        envelope: TestCaseEnvelope,
        #[serde(flatten)]
        body: GherkinBody,
    },
    Steps {
        #[serde(flatten)]
        envelope: TestCaseEnvelope,
        #[serde(flatten)]
        body: StepsBody,
    },
    Table {
        #[serde(flatten)]
        envelope: TestCaseEnvelope,
        #[serde(flatten)]
        body: TableBody,
    },
}

impl TestCase {
    pub fn envelope(&self) -> &TestCaseEnvelope {
        match self {
            TestCase::Gherkin { envelope, .. }
            | TestCase::Steps { envelope, .. }
            | TestCase::Table { envelope, .. } => envelope,
        }
    }

    pub fn id(&self) -> &str {
        &self.envelope().id
    }

    /// Text used by downstream keyword matching (coverage-gap analysis,
    /// negative/edge-case detection) — every format flattened to prose.
    pub fn searchable_text(&self) -> String {
        match self {
            TestCase::Gherkin { body, .. } => {
                let mut s = body.scenario.clone();
                s.push(' ');
                s.push_str(&body.given.join(" "));
                s.push(' ');
                s.push_str(&body.when.join(" "));
                s.push(' ');
                s.push_str(&body.then.join(" "));
                s
            }
            TestCase::Steps { body, .. } => {
                let mut s = format!("{} {}", body.title, body.objective);
                for step in &body.steps {
                    s.push(' ');
                    s.push_str(&step.action);
                    s.push(' ');
                    s.push_str(&step.expected_result);
                }
                s
            }
            TestCase::Table { body, .. } => {
                format!("{} {} {}", body.title, body.description, body.expected_outcome)
            }
        }
    }

    pub fn placeholder(id: impl Into<String>, format: super::qa_profile::TestCaseFormat) -> Self {
        let envelope = TestCaseEnvelope {
            id: id.into(),
            category: "unknown".to_string(),
            priority: TcPriority::Medium,
            estimated_time: None,
        };
        match format {
            super::qa_profile::TestCaseFormat::Gherkin => TestCase::Gherkin {
                envelope,
                body: GherkinBody {
                    scenario: "[Degraded] Test case generation unavailable".to_string(),
                    given: vec!["the test case generator failed".to_string()],
                    when: vec!["a reviewer inspects this canvas".to_string()],
                    then: vec!["they must author this scenario manually".to_string()],
                    tags: vec!["degraded".to_string()],
                },
            },
            super::qa_profile::TestCaseFormat::Steps => TestCase::Steps {
                envelope,
                body: StepsBody {
                    title: "[Degraded] Test case generation unavailable".to_string(),
                    objective: "Placeholder inserted because test case generation failed."
                        .to_string(),
                    preconditions: Vec::new(),
                    steps: vec![StepEntry {
                        step_number: 1,
                        action: "Author this test case manually".to_string(),
                        expected_result: "N/A".to_string(),
                        notes: Some("Generated as a degraded placeholder".to_string()),
                    }],
                    postconditions: Vec::new(),
                },
            },
            super::qa_profile::TestCaseFormat::Table => TestCase::Table {
                envelope,
                body: TableBody {
                    title: "[Degraded] Test case generation unavailable".to_string(),
                    description: "Placeholder inserted because test case generation failed."
                        .to_string(),
                    expected_outcome: "N/A".to_string(),
                    notes: Some("Generated as a degraded placeholder".to_string()),
                },
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasSection {
    TicketSummary,
    AcceptanceCriteria,
    TestCases,
    ConfigurationWarnings,
    Metadata,
}

impl CanvasSection {
    pub const ALL: [CanvasSection; 5] = [
        CanvasSection::TicketSummary,
        CanvasSection::AcceptanceCriteria,
        CanvasSection::TestCases,
        CanvasSection::ConfigurationWarnings,
        CanvasSection::Metadata,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasMetadata {
    pub ticket_id: String,
    pub qa_profile: QAProfile,
    pub generated_at: DateTime<Utc>,
    pub document_version: String,
    #[serde(default)]
    pub previous_version: Option<String>,
    #[serde(default)]
    pub ai_model: Option<String>,
    #[serde(default)]
    pub generation_time_ms: Option<u64>,
    #[serde(default)]
    pub regeneration_reason: Option<String>,
    #[serde(default)]
    pub is_partial_result: Option<bool>,
    #[serde(default)]
    pub word_count: Option<u32>,
    /// Assumptions the Uncertainty Layer detected in the generating request
    /// (missing format, vague verbs, conflicting requirements) — empty when
    /// none were detected, never omitted from the wire shape.
    #[serde(default)]
    pub assumptions: Vec<crate::uncertainty::Assumption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QACanvasDocument {
    pub ticket_summary: TicketSummary,
    #[serde(default)]
    pub configuration_warnings: Vec<ConfigurationWarning>,
    pub acceptance_criteria: Vec<AcceptanceCriterion>,
    pub test_cases: Vec<TestCase>,
    pub metadata: CanvasMetadata,
}

impl QACanvasDocument {
    pub fn is_partial(&self) -> bool {
        self.metadata.is_partial_result.unwrap_or(false)
    }
}

fn duplicate_ids(ids: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dupes = Vec::new();
    for id in ids {
        if !seen.insert(id.clone()) {
            dupes.push(id);
        }
    }
    dupes
}

impl Validate for QACanvasDocument {
    fn validate(&self) -> Vec<Issue> {
        let mut issues = self.ticket_summary.validate();

        for dupe in duplicate_ids(self.acceptance_criteria.iter().map(|a| a.id.clone())) {
            issues.push(Issue::custom(
                "acceptance_criteria",
                format!("duplicate acceptance criterion id: {dupe}"),
            ));
        }
        for dupe in duplicate_ids(self.test_cases.iter().map(|t| t.id().to_string())) {
            issues.push(Issue::custom(
                "test_cases",
                format!("duplicate test case id: {dupe}"),
            ));
        }

        if self.metadata.ticket_id.trim().is_empty() {
            issues.push(Issue::missing("metadata.ticket_id"));
        }

        if let Some(prev) = &self.metadata.previous_version {
            if let (Ok(prev_v), Ok(cur_v)) = (
                prev.parse::<f64>(),
                self.metadata.document_version.parse::<f64>(),
            ) {
                if cur_v <= prev_v {
                    issues.push(Issue::custom(
                        "metadata.document_version",
                        format!(
                            "document_version {cur_v} must be strictly greater than previous_version {prev_v}"
                        ),
                    ));
                }
            }
        }

        if self.is_partial() && self.configuration_warnings.is_empty() {
            issues.push(Issue::custom(
                "configuration_warnings",
                "a partial result must carry at least one warning describing the degradation",
            ));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::qa_profile::TestCaseFormat;
    use std::collections::HashMap;

    fn profile() -> QAProfile {
        QAProfile {
            test_case_format: TestCaseFormat::Steps,
            qa_categories: HashMap::new(),
            include_comments: true,
            include_images: true,
            operation_mode: None,
        }
    }

    fn doc() -> QACanvasDocument {
        QACanvasDocument {
            ticket_summary: TicketSummary {
                problem: "p".into(),
                solution: "s".into(),
                context: "c".into(),
            },
            configuration_warnings: Vec::new(),
            acceptance_criteria: vec![AcceptanceCriterion {
                id: "ac-1".into(),
                title: "t".into(),
                description: "d".into(),
                priority: AcPriority::Must,
                category: "functional".into(),
                testable: true,
            }],
            test_cases: vec![TestCase::placeholder("tc-1", TestCaseFormat::Steps)],
            metadata: CanvasMetadata {
                ticket_id: "TEST-1".into(),
                qa_profile: profile(),
                generated_at: Utc::now(),
                document_version: "1.0".into(),
                previous_version: None,
                ai_model: None,
                generation_time_ms: None,
                regeneration_reason: None,
                is_partial_result: None,
                word_count: None,
                assumptions: Vec::new(),
            },
        }
    }

    #[test]
    fn valid_document_has_no_issues() {
        assert!(doc().validate().is_empty());
    }

    #[test]
    fn duplicate_ac_ids_are_flagged() {
        let mut d = doc();
        let dup = d.acceptance_criteria[0].clone();
        d.acceptance_criteria.push(dup);
        assert_eq!(d.validate().len(), 1);
    }

    #[test]
    fn version_must_strictly_increase() {
        let mut d = doc();
        d.metadata.previous_version = Some("1.0".into());
        d.metadata.document_version = "1.0".into();
        assert_eq!(d.validate().len(), 1);
        d.metadata.document_version = "1.1".into();
        assert!(d.validate().is_empty());
    }

    #[test]
    fn partial_result_requires_warning() {
        let mut d = doc();
        d.metadata.is_partial_result = Some(true);
        assert_eq!(d.validate().len(), 1);
        d.configuration_warnings.push(ConfigurationWarning::degradation("test_cases", "timeout"));
        assert!(d.validate().is_empty());
    }

    #[test]
    fn test_case_searchable_text_flattens_gherkin() {
        let tc = TestCase::Gherkin {
            envelope: TestCaseEnvelope {
                id: "tc-1".into(),
                category: "negative".into(),
                priority: TcPriority::High,
                estimated_time: None,
            },
            body: GherkinBody {
                scenario: "Reject invalid login".into(),
                given: vec!["a bad password".into()],
                when: vec!["the user submits".into()],
                then: vec!["an error is shown".into()],
                tags: vec![],
            },
        };
        assert!(tc.searchable_text().contains("Reject invalid login"));
    }
}
