//! Work item -> scheduler task normalization.
//!
//! Every item in the store becomes exactly one [`Task`]. Blocking edges are
//! sorted into real dependencies, satisfied ones (closed blockers) and
//! problems that are reported as diagnostics instead of graph edges.

use std::collections::BTreeSet;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::issue::{Diagnostics, IssueReason, SchedulingIssue};
use crate::package::{package_id, PackageOrder};
use crate::privacy::{dep_id_for_log, repo_for_log, task_id_for_log, PrivacyFilter};
use crate::store::WorkItemStore;

/// Scheduler input for one work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// `owner/repo#N`, or `draft:<slot>`.
    pub id: String,
    pub name: String,
    /// Stable position in the task list; carries no meaning beyond order.
    pub sequence: usize,
    /// Store key of the source item.
    pub reference: String,
    pub estimate_low: f64,
    pub estimate_high: f64,
    pub done: bool,
    pub on_hold: bool,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    pub package_order: usize,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// A resource with a weekly working calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    /// Hours per day, Monday first.
    pub weekday_hours: [f64; 7],
}

impl User {
    /// Working Monday through Friday.
    pub fn weekdays(id: impl Into<String>, hours: f64) -> Self {
        Self {
            id: id.into(),
            weekday_hours: [hours, hours, hours, hours, hours, 0.0, 0.0],
        }
    }

    pub fn hours_on(&self, day: Weekday) -> f64 {
        self.weekday_hours[day.num_days_from_monday() as usize]
    }
}

/// Everything the scheduler needs, plus what kept items from being schedulable.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub tasks: Vec<Task>,
    pub users: Vec<User>,
    pub issues: Diagnostics,
}

/// Convert the store into tasks, users and diagnostics.
///
/// Items are visited in display order. Diagnostics are only raised for tasks
/// that are being actively scheduled (neither on hold nor done). Default
/// estimates still apply when a missing-estimate diagnostic is raised.
/// Estimate diagnostics name the project's configured estimate fields.
pub fn normalize(
    store: &WorkItemStore,
    config: &Config,
    privacy: Option<&PrivacyFilter>,
) -> Normalized {
    let fields = &config.fields;
    let config = &config.scheduling;
    let ordered = store.in_display_order();
    let packages = PackageOrder::build(ordered.iter().map(|(_, item)| *item));

    let mut tasks = Vec::with_capacity(ordered.len());
    let mut issues = Diagnostics::new();
    let mut user_ids = BTreeSet::new();

    for (sequence, (reference, item)) in ordered.into_iter().enumerate() {
        let done = item.is_closed();
        let on_hold = item.is_on_hold(&config.on_hold_status);
        let (estimate_low, estimate_high) =
            match (item.low_estimate, item.high_estimate, done) {
                (None, None, false) => (
                    config.default_low_estimate,
                    config.default_high_estimate,
                ),
                (low, high, _) => (low.unwrap_or_default(), high.unwrap_or_default()),
            };
        let user = item
            .assignee
            .as_deref()
            .filter(|assignee| !assignee.is_empty())
            .unwrap_or(config.unassigned_user.as_str())
            .to_string();
        user_ids.insert(user.clone());

        let mut task = Task {
            id: item.task_id(),
            name: item.title.clone(),
            sequence,
            reference: reference.to_string(),
            estimate_low,
            estimate_high,
            done,
            on_hold,
            user,
            package_id: package_id(item).map(str::to_string),
            package_order: packages.rank_for(item),
            depends_on: Vec::new(),
        };

        let log_id = task_id_for_log(privacy, &task.id);
        let mut missing_deps = Vec::new();
        let mut on_hold_deps = Vec::new();
        for blocker in &item.blocked_by {
            let dep_id = blocker.task_id();
            let Some(blocker_item) = store.get_issue(blocker) else {
                warn!(
                    "Skipping dependency {} for {}: task not accessible (grant access to {})",
                    dep_id_for_log(privacy, &dep_id),
                    log_id,
                    repo_for_log(privacy, &blocker.owner, &blocker.repo)
                );
                missing_deps.push(dep_id);
                continue;
            };
            if blocker_item.is_closed() {
                debug!(
                    "Skipping dependency {} for {}: blocker is closed",
                    dep_id_for_log(privacy, &dep_id),
                    log_id
                );
                continue;
            }
            if blocker_item.is_on_hold(&config.on_hold_status) {
                debug!(
                    "Dependency {} for {} is on-hold",
                    dep_id_for_log(privacy, &dep_id),
                    log_id
                );
                on_hold_deps.push(dep_id);
                continue;
            }
            if task.depends_on.contains(&dep_id) {
                continue;
            }
            debug!(
                "Added dependency: {} depends on {}",
                log_id,
                dep_id_for_log(privacy, &dep_id)
            );
            task.depends_on.push(dep_id);
        }

        if !task.on_hold && !task.done {
            let mut raise = |reason: IssueReason, details: Vec<String>| {
                issues.push(SchedulingIssue::for_item(reference, item, reason, details));
            };
            if !missing_deps.is_empty() {
                raise(IssueReason::MissingDependency, missing_deps);
            }
            if !on_hold_deps.is_empty() {
                raise(IssueReason::OnholdDependency, on_hold_deps);
            }
            if item.inaccessible_blockers > 0 {
                raise(
                    IssueReason::InaccessibleDependency,
                    vec![format!(
                        "{} blocker(s) from inaccessible repositories",
                        item.inaccessible_blockers
                    )],
                );
            }

            let mut missing_estimates = Vec::new();
            if item.low_estimate.is_none() {
                missing_estimates.push(fields.low_estimate.clone());
            }
            if item.high_estimate.is_none() {
                missing_estimates.push(fields.high_estimate.clone());
            }
            if !missing_estimates.is_empty() {
                raise(IssueReason::MissingEstimate, missing_estimates);
            }

            if let (Some(low), Some(high)) = (item.low_estimate, item.high_estimate) {
                if high < low {
                    raise(
                        IssueReason::InvalidEstimate,
                        vec![format!(
                            "{} ({high:.1}) must be greater than or equal to {} ({low:.1})",
                            fields.high_estimate, fields.low_estimate
                        )],
                    );
                }
            }
        }

        tasks.push(task);
    }

    if user_ids.is_empty() {
        user_ids.insert(config.unassigned_user.clone());
    }
    let users = user_ids
        .into_iter()
        .map(|id| User::weekdays(id, config.weekday_hours))
        .collect();

    Normalized {
        tasks,
        users,
        issues,
    }
}
