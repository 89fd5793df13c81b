//! Desired vs. observed date reconciliation.
//!
//! Three passes with strict precedence, each item decided at most once:
//!
//! 1. terminal states: closed and on-hold items are cleared when they still
//!    carry something to clear;
//! 2. unschedulable items that still carry dates are cleared;
//! 3. remaining scheduled tasks get their dates set, unless the recorded
//!    dates already match on the calendar day.
//!
//! The result is the minimal write set: a second run over the written state
//! produces nothing.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::item::{ProjectLink, WorkItem};
use crate::privacy::{task_id_for_log, PrivacyFilter};
use crate::schedule::ScheduleEntry;
use crate::store::WorkItemStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClearReason {
    #[serde(rename = "closed")]
    Closed,
    #[serde(rename = "on hold")]
    OnHold,
    #[serde(rename = "unschedulable")]
    Unschedulable,
}

impl ClearReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClearReason::Closed => "closed",
            ClearReason::OnHold => "on hold",
            ClearReason::Unschedulable => "unschedulable",
        }
    }

    /// Closed items lose their estimates too; everything else keeps its sizing.
    pub fn clears_estimates(&self) -> bool {
        matches!(self, ClearReason::Closed)
    }
}

impl fmt::Display for ClearReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UpdateAction {
    Clear {
        reason: ClearReason,
    },
    SetDates {
        expected_start: Option<DateTime<Utc>>,
        mean_completion: Option<DateTime<Utc>>,
        completion_98: Option<DateTime<Utc>>,
    },
}

/// A proposed write for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateUpdate {
    pub reference: String,
    pub owner: String,
    pub repo: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    pub name: String,
    pub project: ProjectLink,
    #[serde(flatten)]
    pub action: UpdateAction,
}

impl DateUpdate {
    fn new(reference: &str, item: &WorkItem, project: &ProjectLink, action: UpdateAction) -> Self {
        Self {
            reference: reference.to_string(),
            owner: item.owner.clone(),
            repo: item.repo.clone(),
            number: item.number,
            name: item.title.clone(),
            project: project.clone(),
            action,
        }
    }

    pub fn is_clear(&self) -> bool {
        matches!(self.action, UpdateAction::Clear { .. })
    }

    pub fn clear_reason(&self) -> Option<ClearReason> {
        match self.action {
            UpdateAction::Clear { reason } => Some(reason),
            UpdateAction::SetDates { .. } => None,
        }
    }

    pub fn mean_completion(&self) -> Option<DateTime<Utc>> {
        match self.action {
            UpdateAction::SetDates {
                mean_completion, ..
            } => mean_completion,
            UpdateAction::Clear { .. } => None,
        }
    }
}

/// Calendar-day equality between a recorded date and a proposed one.
///
/// An unset recorded date matches only an absent proposal.
pub fn same_date(existing: Option<NaiveDate>, proposed: Option<DateTime<Utc>>) -> bool {
    match (existing, proposed) {
        (None, proposed) => proposed.is_none(),
        (Some(recorded), Some(proposed)) => recorded == proposed.date_naive(),
        (Some(_), None) => false,
    }
}

/// Compute the writes that bring recorded dates in line with the schedule.
///
/// `unschedulable` holds the reference keys of items with any diagnostic.
pub fn prepare_updates(
    entries: &[ScheduleEntry],
    store: &WorkItemStore,
    unschedulable: &HashSet<String>,
    on_hold_status: &str,
    privacy: Option<&PrivacyFilter>,
) -> Vec<DateUpdate> {
    let mut updates = Vec::new();
    let mut processed: HashSet<&str> = HashSet::new();

    // Pass 1: closed and on-hold items. Closed wins when both apply.
    for (reference, item) in store.iter() {
        let Some(project) = &item.project else {
            continue;
        };
        let closed = item.is_closed();
        let on_hold = item.is_on_hold(on_hold_status);
        if !closed && !on_hold {
            continue;
        }
        processed.insert(reference);

        let reason = if closed {
            if !item.has_any_date() && !item.has_any_estimate() {
                continue;
            }
            ClearReason::Closed
        } else {
            if !item.has_any_date() {
                continue;
            }
            ClearReason::OnHold
        };
        updates.push(DateUpdate::new(
            reference,
            item,
            project,
            UpdateAction::Clear { reason },
        ));
    }

    // Pass 2: active items that cannot be scheduled lose stale dates.
    for (reference, item) in store.iter() {
        let Some(project) = &item.project else {
            continue;
        };
        if processed.contains(reference) || !unschedulable.contains(reference) {
            continue;
        }
        if !item.has_any_date() {
            continue;
        }
        processed.insert(reference);
        updates.push(DateUpdate::new(
            reference,
            item,
            project,
            UpdateAction::Clear {
                reason: ClearReason::Unschedulable,
            },
        ));
    }

    // Pass 3: apply the schedule to whatever is left.
    let task_index: HashMap<String, String> = store.task_index();
    for entry in entries {
        if entry.is_package {
            continue;
        }
        let Some((reference, item)) = task_index
            .get(&entry.id)
            .and_then(|key| store.get(key).map(|item| (key.as_str(), item)))
        else {
            debug!(
                "No work item found for task {}",
                task_id_for_log(privacy, &entry.id)
            );
            continue;
        };
        let Some(project) = &item.project else {
            debug!(
                "Work item {} is not in a project",
                task_id_for_log(privacy, &entry.id)
            );
            continue;
        };
        if processed.contains(reference) || unschedulable.contains(reference) {
            continue;
        }
        if same_date(item.expected_start, entry.expected_start)
            && same_date(item.expected_completion, entry.mean_completion)
            && same_date(item.completion_98, entry.completion_98)
        {
            debug!(
                "Dates unchanged for {}, skipping",
                task_id_for_log(privacy, &entry.id)
            );
            continue;
        }

        let mut update = DateUpdate::new(
            reference,
            item,
            project,
            UpdateAction::SetDates {
                expected_start: entry.expected_start,
                mean_completion: entry.mean_completion,
                completion_98: entry.completion_98,
            },
        );
        if !entry.name.is_empty() {
            update.name = entry.name.clone();
        }
        updates.push(update);
    }

    updates
}
