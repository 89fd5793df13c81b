//! Scheduling comments on tracker issues.
//!
//! An issue holding any diagnostic carries one scheduling comment that
//! explains it. Once the issue is schedulable again the comment is removed.
//! Rendering the comment body is up to the writer; this module only decides
//! which comments to post, replace or delete.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::issue::SchedulingIssue;
use crate::privacy::PrivacyFilter;
use crate::store::WorkItemStore;

/// Comment operations against a tracker issue.
pub trait CommentWriter {
    /// Create the scheduling comment, or replace `existing` in place.
    fn upsert_comment(
        &mut self,
        owner: &str,
        repo: &str,
        number: u64,
        existing: Option<u64>,
        issues: &[SchedulingIssue],
    ) -> anyhow::Result<()>;

    fn delete_comment(
        &mut self,
        owner: &str,
        repo: &str,
        number: u64,
        comment_id: u64,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CommentAction {
    Upsert {
        #[serde(skip_serializing_if = "Option::is_none")]
        comment_id: Option<u64>,
        issues: Vec<SchedulingIssue>,
    },
    Delete {
        comment_id: u64,
    },
}

/// A planned comment change for one issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentUpdate {
    pub reference: String,
    pub owner: String,
    pub repo: String,
    pub number: u64,
    #[serde(flatten)]
    pub action: CommentAction,
}

impl CommentUpdate {
    pub fn is_delete(&self) -> bool {
        matches!(self.action, CommentAction::Delete { .. })
    }
}

/// Decide the comment change for every issue in the store.
///
/// `issues` are the run's final diagnostics, already redacted for display.
/// Issues with diagnostics get their comment posted or replaced; issues
/// without any lose a comment only when one exists. Drafts have no comments.
pub fn plan_comments(store: &WorkItemStore, issues: &[SchedulingIssue]) -> Vec<CommentUpdate> {
    let mut by_reference: BTreeMap<&str, Vec<SchedulingIssue>> = BTreeMap::new();
    for issue in issues {
        by_reference
            .entry(issue.reference.as_str())
            .or_default()
            .push(issue.clone());
    }

    let mut updates = Vec::new();
    for (reference, item) in store.iter() {
        let Some(number) = item.number else {
            if by_reference.contains_key(reference) {
                debug!("No comment for draft {reference}: drafts cannot be commented on");
            }
            continue;
        };
        let action = match (by_reference.remove(reference), item.scheduling_comment_id) {
            (Some(issues), comment_id) => CommentAction::Upsert { comment_id, issues },
            (None, Some(comment_id)) => CommentAction::Delete { comment_id },
            (None, None) => continue,
        };
        updates.push(CommentUpdate {
            reference: reference.to_string(),
            owner: item.owner.clone(),
            repo: item.repo.clone(),
            number,
            action,
        });
    }
    updates
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommentSummary {
    pub posted: usize,
    pub deleted: usize,
    pub failed: usize,
}

/// Apply planned comment changes. A failure is logged and counted; the
/// remaining changes still go out.
pub fn apply_comments<W: CommentWriter + ?Sized>(
    writer: &mut W,
    updates: &[CommentUpdate],
    privacy: Option<&PrivacyFilter>,
) -> CommentSummary {
    let mut summary = CommentSummary::default();
    for update in updates {
        let result = match &update.action {
            CommentAction::Upsert { comment_id, issues } => writer
                .upsert_comment(&update.owner, &update.repo, update.number, *comment_id, issues)
                .map(|()| summary.posted += 1),
            CommentAction::Delete { comment_id } => writer
                .delete_comment(&update.owner, &update.repo, update.number, *comment_id)
                .map(|()| summary.deleted += 1),
        };
        if let Err(err) = result {
            let label = match privacy {
                Some(filter) => filter.redact_ref(&update.owner, &update.repo, update.number),
                None => format!("{}/{} #{}", update.owner, update.repo, update.number),
            };
            warn!("Failed to update scheduling comment for {}: {:#}", label, err);
            summary.failed += 1;
        }
    }
    summary
}
