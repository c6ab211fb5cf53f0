//! Declarative validation primitives shared by every schema in this module.
//!
//! Every boundary structure implements [`Validate`] and gets `parse`/
//! `safe_parse` for free via [`parse_json`]/[`safe_parse_json`]. Unknown
//! fields are forbidden on output structs via `#[serde(deny_unknown_fields)]`
//! at the type definition; input structs deliberately omit that attribute so
//! unknown fields from upstream producers (the ticket scraper, older
//! clients) are ignored rather than rejected.

use serde::{Deserialize, Serialize};

/// Machine-readable validation failure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    InvalidType,
    Missing,
    InvalidEnum,
    InvalidString,
    Range,
    Custom,
}

/// A single validation issue, addressed by a dotted/bracketed path
/// (`"test_cases[2].scenario"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub path: String,
    pub code: IssueCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
}

impl Issue {
    pub fn new(path: impl Into<String>, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            code,
            message: message.into(),
            received: None,
        }
    }

    pub fn missing(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::new(path.clone(), IssueCode::Missing, format!("{path} is required"))
    }

    pub fn invalid_enum(path: impl Into<String>, received: impl Into<String>) -> Self {
        let path = path.into();
        let received = received.into();
        Self {
            path: path.clone(),
            code: IssueCode::InvalidEnum,
            message: format!("{path} is not a recognized value"),
            received: Some(received),
        }
    }

    pub fn custom(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(path, IssueCode::Custom, message)
    }

    pub fn with_received(mut self, received: impl Into<String>) -> Self {
        self.received = Some(received.into());
        self
    }
}

/// Raised by `parse`; carries every issue found, not just the first.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
#[error("validation failed with {} issue(s)", issues.len())]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    pub fn new(issues: Vec<Issue>) -> Self {
        Self { issues }
    }

    pub fn single(issue: Issue) -> Self {
        Self { issues: vec![issue] }
    }
}

/// Implemented by every schema-validated type. `validate` checks invariants
/// that serde's `Deserialize` cannot express (non-empty strings, id
/// uniqueness within a sequence, closed-set string enums arriving as raw
/// JSON strings from a generative model).
pub trait Validate {
    fn validate(&self) -> Vec<Issue>;
}

/// Deserialize `raw` and run [`Validate::validate`], returning every issue
/// found. Never panics.
pub fn safe_parse<T>(raw: &str) -> Result<T, ValidationError>
where
    T: for<'de> Deserialize<'de> + Validate,
{
    let value: T = serde_json::from_str(raw).map_err(|e| {
        ValidationError::single(Issue::new(
            "$",
            IssueCode::InvalidType,
            format!("could not deserialize: {e}"),
        ))
    })?;
    let issues = value.validate();
    if issues.is_empty() {
        Ok(value)
    } else {
        Err(ValidationError::new(issues))
    }
}

/// Same as [`safe_parse`] but from an already-deserialized `serde_json::Value`.
pub fn safe_parse_value<T>(value: serde_json::Value) -> Result<T, ValidationError>
where
    T: for<'de> Deserialize<'de> + Validate,
{
    let value: T = serde_json::from_value(value).map_err(|e| {
        ValidationError::single(Issue::new(
            "$",
            IssueCode::InvalidType,
            format!("could not deserialize: {e}"),
        ))
    })?;
    let issues = value.validate();
    if issues.is_empty() {
        Ok(value)
    } else {
        Err(ValidationError::new(issues))
    }
}

/// Non-empty-string check used across most schemas.
pub fn require_non_empty(path: &str, value: &str) -> Option<Issue> {
    if value.trim().is_empty() {
        Some(Issue::new(
            path,
            IssueCode::InvalidString,
            format!("{path} must not be empty"),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    impl Validate for Point {
        fn validate(&self) -> Vec<Issue> {
            let mut issues = Vec::new();
            if self.x < 0 {
                issues.push(Issue::new("x", IssueCode::Range, "x must be >= 0"));
            }
            if self.y < 0 {
                issues.push(Issue::new("y", IssueCode::Range, "y must be >= 0"));
            }
            issues
        }
    }

    #[test]
    fn safe_parse_accepts_valid() {
        let p: Point = safe_parse(r#"{"x":1,"y":2}"#).unwrap();
        assert_eq!(p.x, 1);
    }

    #[test]
    fn safe_parse_collects_all_issues() {
        let err = safe_parse::<Point>(r#"{"x":-1,"y":-2}"#).unwrap_err();
        assert_eq!(err.issues.len(), 2);
    }

    #[test]
    fn safe_parse_never_panics_on_garbage() {
        let err = safe_parse::<Point>("not json").unwrap_err();
        assert_eq!(err.issues.len(), 1);
    }
}
