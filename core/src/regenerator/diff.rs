//! Deterministic structural diff between an original and a regenerated
//! canvas, compared section by section (§4.5). Pure function: no I/O, no
//! randomness, reproducible from its two inputs alone.

use serde::{Deserialize, Serialize};

use crate::schema::canvas::{CanvasSection, QACanvasDocument, TestCase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
    Preserved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionChange {
    pub section: CanvasSection,
    pub change_type: ChangeType,
    pub description: String,
    #[serde(default)]
    pub old_value: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
}

fn ticket_summary_text(doc: &QACanvasDocument) -> String {
    format!(
        "{} | {} | {}",
        doc.ticket_summary.problem, doc.ticket_summary.solution, doc.ticket_summary.context
    )
}

fn ac_text(ac: &crate::schema::canvas::AcceptanceCriterion) -> String {
    format!("{}: {} ({:?}, {})", ac.title, ac.description, ac.priority, ac.category)
}

fn tc_text(tc: &TestCase) -> String {
    format!("{:?}: {}", tc.envelope().priority, tc.searchable_text())
}

/// Compare `old` against `new`, producing one entry per changed-or-preserved
/// item across all four sections. IDs are assumed to have already been
/// carried per `preserve_structure` before this runs, so an id match here
/// genuinely reflects correspondence, not coincidence.
pub fn compute_diff(old: &QACanvasDocument, new: &QACanvasDocument) -> Vec<SectionChange> {
    let mut changes = Vec::new();

    let old_summary = ticket_summary_text(old);
    let new_summary = ticket_summary_text(new);
    changes.push(SectionChange {
        section: CanvasSection::TicketSummary,
        change_type: if old_summary == new_summary {
            ChangeType::Preserved
        } else {
            ChangeType::Modified
        },
        description: "ticket summary".to_string(),
        old_value: Some(old_summary),
        new_value: Some(new_summary),
    });

    diff_list(
        &mut changes,
        CanvasSection::AcceptanceCriteria,
        old.acceptance_criteria.iter().map(|ac| (ac.id.as_str(), ac.title.clone(), ac_text(ac))),
        new.acceptance_criteria.iter().map(|ac| (ac.id.as_str(), ac.title.clone(), ac_text(ac))),
    );

    diff_list(
        &mut changes,
        CanvasSection::TestCases,
        old.test_cases.iter().map(|tc| (tc.id(), tc.id().to_string(), tc_text(tc))),
        new.test_cases.iter().map(|tc| (tc.id(), tc.id().to_string(), tc_text(tc))),
    );

    let old_warn_count = old.configuration_warnings.len();
    let new_warn_count = new.configuration_warnings.len();
    if old_warn_count != new_warn_count {
        changes.push(SectionChange {
            section: CanvasSection::ConfigurationWarnings,
            change_type: if new_warn_count > old_warn_count {
                ChangeType::Added
            } else {
                ChangeType::Removed
            },
            description: format!("configuration warnings count {old_warn_count} -> {new_warn_count}"),
            old_value: Some(old_warn_count.to_string()),
            new_value: Some(new_warn_count.to_string()),
        });
    } else if old_warn_count > 0 {
        changes.push(SectionChange {
            section: CanvasSection::ConfigurationWarnings,
            change_type: ChangeType::Preserved,
            description: "configuration warnings unchanged in count".to_string(),
            old_value: None,
            new_value: None,
        });
    }

    changes
}

/// Diff a section modeled as an id-keyed list: every old id not present in
/// `new` is `removed`, every new id not present in `old` is `added`, and ids
/// present in both are `modified` or `preserved` depending on content.
fn diff_list<'a>(
    changes: &mut Vec<SectionChange>,
    section: CanvasSection,
    old_items: impl Iterator<Item = (&'a str, String, String)>,
    new_items: impl Iterator<Item = (&'a str, String, String)>,
) {
    let old_items: Vec<(&str, String, String)> = old_items.collect();
    let new_items: Vec<(&str, String, String)> = new_items.collect();

    for (id, label, text) in &old_items {
        match new_items.iter().find(|(nid, _, _)| nid == id) {
            None => changes.push(SectionChange {
                section,
                change_type: ChangeType::Removed,
                description: format!("removed {label}"),
                old_value: Some(text.clone()),
                new_value: None,
            }),
            Some((_, _, new_text)) => {
                if new_text == text {
                    changes.push(SectionChange {
                        section,
                        change_type: ChangeType::Preserved,
                        description: format!("preserved {label}"),
                        old_value: None,
                        new_value: None,
                    });
                } else {
                    changes.push(SectionChange {
                        section,
                        change_type: ChangeType::Modified,
                        description: format!("modified {label}"),
                        old_value: Some(text.clone()),
                        new_value: Some(new_text.clone()),
                    });
                }
            }
        }
    }

    for (id, label, text) in &new_items {
        if !old_items.iter().any(|(oid, _, _)| oid == id) {
            changes.push(SectionChange {
                section,
                change_type: ChangeType::Added,
                description: format!("added {label}"),
                old_value: None,
                new_value: Some(text.clone()),
            });
        }
    }
}

/// Render a diff list into the one-paragraph `changes_summary` string the
/// HTTP response surfaces (§6) — the structured list itself stays internal.
pub fn summarize(changes: &[SectionChange]) -> String {
    let added = changes.iter().filter(|c| c.change_type == ChangeType::Added).count();
    let modified = changes.iter().filter(|c| c.change_type == ChangeType::Modified).count();
    let removed = changes.iter().filter(|c| c.change_type == ChangeType::Removed).count();
    let preserved = changes.iter().filter(|c| c.change_type == ChangeType::Preserved).count();

    format!(
        "{added} added, {modified} modified, {removed} removed, {preserved} preserved across \
         the canvas."
    )
}
