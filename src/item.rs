//! Work items as fetched from the project tracker.
//!
//! A work item is keyed by a reference string that is unique across
//! repositories and across real vs. draft items. Draft items have no issue
//! number and are keyed by their project slot identifier instead.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

const DRAFT_PREFIX: &str = "draft:";
const ISSUE_HOST: &str = "github.com";

/// A pointer at another tracked issue, as carried on blocking edges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IssueRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl IssueRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }

    /// Store key for the referenced issue.
    pub fn reference_key(&self) -> String {
        issue_reference_key(&self.owner, &self.repo, self.number)
    }

    /// Scheduler task id for the referenced issue (`owner/repo#N`).
    pub fn task_id(&self) -> String {
        issue_task_id(&self.owner, &self.repo, self.number)
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

pub fn issue_reference_key(owner: &str, repo: &str, number: u64) -> String {
    format!("{ISSUE_HOST}/{owner}/{repo}/issues/{number}")
}

pub fn issue_task_id(owner: &str, repo: &str, number: u64) -> String {
    format!("{owner}/{repo}#{number}")
}

pub fn draft_key(project_item_id: &str) -> String {
    format!("{DRAFT_PREFIX}{project_item_id}")
}

/// Lifecycle state of a tracked item.
///
/// The tracker reports states in varying case; anything other than `closed`
/// counts as open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    #[default]
    Open,
    Closed,
}

impl ItemState {
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("closed") {
            ItemState::Closed
        } else {
            ItemState::Open
        }
    }
}

impl<'de> Deserialize<'de> for ItemState {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(ItemState::from_label(&raw))
    }
}

/// Where an item lives in the project, and the ids of its writable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectLink {
    pub project_id: String,
    pub item_id: String,
    /// Custom field name -> field id.
    #[serde(default)]
    pub field_ids: BTreeMap<String, String>,
}

impl ProjectLink {
    pub fn field_id(&self, name: &str) -> Option<&str> {
        self.field_ids.get(name).map(String::as_str)
    }
}

/// One tracked item with its scheduling-relevant fields.
///
/// Estimates and recorded dates are optional: an absent value is distinct
/// from zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkItem {
    pub owner: String,
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    pub title: String,
    pub state: ItemState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_estimate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduling_status: Option<String>,
    /// Position in the tracker's native ordering.
    pub order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_start: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_completion: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_98: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectLink>,
    pub is_draft: bool,
    pub is_private: bool,
    pub has_scheduling_dates: bool,
    pub has_estimates: bool,
    /// Blockers that exist but live in repositories we cannot read.
    pub inaccessible_blockers: u32,
    pub blocked_by: Vec<IssueRef>,
    pub blocking: Vec<IssueRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_item_id: Option<String>,
    /// Id of the scheduling comment already posted on the issue, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduling_comment_id: Option<u64>,
}

impl WorkItem {
    /// Store key: `github.com/owner/repo/issues/N`, or `draft:<slot>` for drafts.
    pub fn reference_key(&self) -> String {
        match self.issue_ref() {
            Some(issue) => issue.reference_key(),
            None => draft_key(self.project_item_id.as_deref().unwrap_or_default()),
        }
    }

    /// Scheduler task id: `owner/repo#N`, or `draft:<slot>` for drafts.
    pub fn task_id(&self) -> String {
        match self.issue_ref() {
            Some(issue) => issue.task_id(),
            None => draft_key(self.project_item_id.as_deref().unwrap_or_default()),
        }
    }

    /// The item as an edge target. Drafts cannot be referenced.
    pub fn issue_ref(&self) -> Option<IssueRef> {
        if self.is_draft {
            return None;
        }
        self.number
            .map(|number| IssueRef::new(self.owner.clone(), self.repo.clone(), number))
    }

    pub fn repo_key(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    pub fn is_closed(&self) -> bool {
        self.state == ItemState::Closed
    }

    /// On hold via the scheduling status field, or by being a draft.
    pub fn is_on_hold(&self, on_hold_status: &str) -> bool {
        self.is_draft || self.scheduling_status.as_deref() == Some(on_hold_status)
    }

    pub fn has_any_date(&self) -> bool {
        self.has_scheduling_dates
            || self.expected_start.is_some()
            || self.expected_completion.is_some()
            || self.completion_98.is_some()
    }

    /// Looks at the estimate values only; the snapshot's `has_estimates` flag
    /// is informational.
    pub fn has_any_estimate(&self) -> bool {
        self.low_estimate.is_some() || self.high_estimate.is_some()
    }

    /// Reject snapshots that cannot be keyed.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.is_draft {
            return match self.project_item_id.as_deref() {
                Some(id) if !id.trim().is_empty() => Ok(()),
                _ => Err(format!("draft '{}' has no project item id", self.title)),
            };
        }
        if self.owner.trim().is_empty() || self.repo.trim().is_empty() {
            return Err(format!("item '{}' has no owner/repo", self.title));
        }
        if self.number.is_none() {
            return Err(format!(
                "item '{}' in {} has no issue number",
                self.title,
                self.repo_key()
            ));
        }
        Ok(())
    }
}
