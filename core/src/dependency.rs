//! Dependency Graph — the static edges between canvas sections that define
//! which modifications cascade into which other sections.
//!
//! `ticket_summary → {acceptance_criteria, test_cases}` and
//! `acceptance_criteria → test_cases`. Analyzing an unchanged target-section
//! set is idempotent: the graph is pure data, the analysis is a pure
//! function over it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::schema::canvas::CanvasSection;

/// Directed edges, fixed at compile time.
const EDGES: &[(CanvasSection, CanvasSection)] = &[
    (CanvasSection::TicketSummary, CanvasSection::AcceptanceCriteria),
    (CanvasSection::TicketSummary, CanvasSection::TestCases),
    (CanvasSection::AcceptanceCriteria, CanvasSection::TestCases),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictRisk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyAnalysis {
    pub affected_sections: Vec<CanvasSection>,
    pub cascade_required: bool,
    pub conflict_risk: ConflictRisk,
}

/// Direct successors of `section` per the static edge table.
fn direct_successors(section: CanvasSection) -> impl Iterator<Item = CanvasSection> + '_ {
    EDGES
        .iter()
        .filter(move |(from, _)| *from == section)
        .map(|(_, to)| *to)
}

/// Analyze which sections are transitively affected by modifying
/// `targets`, and how risky cascading that modification is.
///
/// Idempotent: calling this twice with the same `targets` against an
/// unchanged graph returns an identical result, since the graph carries no
/// mutable state — only `targets` (the caller's current intent) varies.
pub fn analyze(targets: &[CanvasSection]) -> DependencyAnalysis {
    let mut affected: BTreeSet<CanvasSection> = targets.iter().copied().collect();
    let mut frontier: Vec<CanvasSection> = targets.to_vec();

    while let Some(section) = frontier.pop() {
        for successor in direct_successors(section) {
            if affected.insert(successor) {
                frontier.push(successor);
            }
        }
    }

    let cascade_required = affected.len() > targets.len();

    // Multiple independently-modified sections that also share a downstream
    // dependent (test_cases) is the highest-risk shape: a regeneration pass
    // must reconcile two upstream changes against one downstream section.
    let touches_both_upstream = targets.contains(&CanvasSection::TicketSummary)
        && targets.contains(&CanvasSection::AcceptanceCriteria);
    let conflict_risk = if touches_both_upstream {
        ConflictRisk::High
    } else if cascade_required {
        ConflictRisk::Medium
    } else {
        ConflictRisk::Low
    };

    DependencyAnalysis {
        affected_sections: affected.into_iter().collect(),
        cascade_required,
        conflict_risk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acceptance_criteria_change_cascades_to_test_cases() {
        let analysis = analyze(&[CanvasSection::AcceptanceCriteria]);
        assert!(analysis.cascade_required);
        assert!(analysis.affected_sections.contains(&CanvasSection::TestCases));
    }

    #[test]
    fn ticket_summary_change_cascades_to_both_downstream_sections() {
        let analysis = analyze(&[CanvasSection::TicketSummary]);
        assert!(analysis.affected_sections.contains(&CanvasSection::AcceptanceCriteria));
        assert!(analysis.affected_sections.contains(&CanvasSection::TestCases));
    }

    #[test]
    fn test_cases_change_alone_does_not_cascade() {
        let analysis = analyze(&[CanvasSection::TestCases]);
        assert!(!analysis.cascade_required);
        assert_eq!(analysis.conflict_risk, ConflictRisk::Low);
    }

    #[test]
    fn touching_both_upstream_sections_is_high_risk() {
        let analysis = analyze(&[CanvasSection::TicketSummary, CanvasSection::AcceptanceCriteria]);
        assert_eq!(analysis.conflict_risk, ConflictRisk::High);
    }

    #[test]
    fn analysis_is_idempotent_given_unchanged_targets() {
        let a = analyze(&[CanvasSection::AcceptanceCriteria]);
        let b = analyze(&[CanvasSection::AcceptanceCriteria]);
        assert_eq!(a.affected_sections, b.affected_sections);
        assert_eq!(a.cascade_required, b.cascade_required);
        assert_eq!(a.conflict_risk, b.conflict_risk);
    }
}
