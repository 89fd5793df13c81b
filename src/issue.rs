//! Scheduling diagnostics.
//!
//! A [`SchedulingIssue`] explains why an item cannot be scheduled right now,
//! or why its forecast is at risk. They are routine data, not errors.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::item::WorkItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueReason {
    Cycle,
    MissingDependency,
    OnholdDependency,
    InaccessibleDependency,
    MissingEstimate,
    InvalidEstimate,
    AtRisk,
}

impl IssueReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueReason::Cycle => "cycle",
            IssueReason::MissingDependency => "missing_dependency",
            IssueReason::OnholdDependency => "onhold_dependency",
            IssueReason::InaccessibleDependency => "inaccessible_dependency",
            IssueReason::MissingEstimate => "missing_estimate",
            IssueReason::InvalidEstimate => "invalid_estimate",
            IssueReason::AtRisk => "at_risk",
        }
    }
}

impl fmt::Display for IssueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingIssue {
    /// Store key of the affected item.
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    pub owner: String,
    pub repo: String,
    pub reason: IssueReason,
    /// Shape depends on the reason: dependency ids, field names, a cycle
    /// path, or labelled dates.
    pub details: Vec<String>,
}

impl SchedulingIssue {
    pub fn for_item(
        reference: impl Into<String>,
        item: &WorkItem,
        reason: IssueReason,
        details: Vec<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            number: item.number,
            owner: item.owner.clone(),
            repo: item.repo.clone(),
            reason,
            details,
        }
    }
}

/// Run-wide diagnostics accumulator.
///
/// Holds at most one issue per (reference, reason).
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    issues: Vec<SchedulingIssue>,
    seen: HashSet<(String, IssueReason)>,
    references: HashSet<String>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_issues(issues: impl IntoIterator<Item = SchedulingIssue>) -> Self {
        let mut diagnostics = Self::new();
        diagnostics.extend(issues);
        diagnostics
    }

    /// Record an issue. Returns false if the item already has one for the
    /// same reason.
    pub fn push(&mut self, issue: SchedulingIssue) -> bool {
        if !self.seen.insert((issue.reference.clone(), issue.reason)) {
            return false;
        }
        self.references.insert(issue.reference.clone());
        self.issues.push(issue);
        true
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = SchedulingIssue>) {
        for issue in issues {
            self.push(issue);
        }
    }

    /// Whether the item holds any issue at all.
    pub fn has_any(&self, reference: &str) -> bool {
        self.references.contains(reference)
    }

    pub fn has(&self, reference: &str, reason: IssueReason) -> bool {
        self.seen.contains(&(reference.to_string(), reason))
    }

    /// References of every item holding an issue.
    pub fn flagged(&self) -> HashSet<String> {
        self.references.clone()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchedulingIssue> {
        self.issues.iter()
    }

    /// Issues ordered by reference, then reason.
    pub fn into_sorted(self) -> Vec<SchedulingIssue> {
        let mut issues = self.issues;
        issues.sort_by(|a, b| {
            a.reference
                .cmp(&b.reference)
                .then_with(|| a.reason.as_str().cmp(b.reason.as_str()))
        });
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(reference: &str, reason: IssueReason) -> SchedulingIssue {
        SchedulingIssue {
            reference: reference.to_string(),
            number: Some(1),
            owner: "o".to_string(),
            repo: "r".to_string(),
            reason,
            details: Vec::new(),
        }
    }

    #[test]
    fn one_issue_per_reference_and_reason() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.push(issue("a", IssueReason::Cycle)));
        assert!(!diagnostics.push(issue("a", IssueReason::Cycle)));
        assert!(diagnostics.push(issue("a", IssueReason::MissingEstimate)));
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.has_any("a"));
        assert!(!diagnostics.has_any("b"));
    }

    #[test]
    fn sorted_by_reference_then_reason() {
        let diagnostics = Diagnostics::from_issues(vec![
            issue("b", IssueReason::Cycle),
            issue("a", IssueReason::MissingEstimate),
            issue("a", IssueReason::AtRisk),
        ]);
        let order: Vec<(String, &str)> = diagnostics
            .into_sorted()
            .into_iter()
            .map(|i| (i.reference, i.reason.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a".to_string(), "at_risk"),
                ("a".to_string(), "missing_estimate"),
                ("b".to_string(), "cycle"),
            ]
        );
    }
}
