//! One reconciliation run, end to end.
//!
//! store -> reverse edges -> normalize -> scheduler -> cycle diagnostics ->
//! three-pass diff -> at-risk diagnostics. No I/O happens here beyond the
//! scheduler call; writing the updates is left to the caller.

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::cycle::extract_cycle_issues;
use crate::error::{Error, Result};
use crate::issue::SchedulingIssue;
use crate::privacy::PrivacyFilter;
use crate::reconcile::{prepare_updates, DateUpdate};
use crate::risk::detect_at_risk;
use crate::schedule::{ScheduleEntry, Scheduler};
use crate::store::WorkItemStore;
use crate::task::{normalize, Normalized, Task, User};

/// Output of a full run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunOutcome {
    pub tasks: Vec<Task>,
    pub users: Vec<User>,
    pub updates: Vec<DateUpdate>,
    /// Sorted by reference, then reason.
    pub issues: Vec<SchedulingIssue>,
}

/// Privacy filter for the run's current repository.
pub fn privacy_filter(store: &WorkItemStore, config: &Config) -> PrivacyFilter {
    PrivacyFilter::new(config.privacy.current_repo.as_deref(), store)
}

/// Enrich the store with reverse edges and build the scheduler input.
pub fn plan(
    store: &mut WorkItemStore,
    config: &Config,
    privacy: Option<&PrivacyFilter>,
) -> Normalized {
    let added = store.build_reverse_dependencies(privacy);
    if added > 0 {
        info!("Added {added} reverse dependency edge(s)");
    }
    normalize(store, config, privacy)
}

/// Turn scheduler output into writes and the final diagnostic list.
pub fn reconcile(
    store: &WorkItemStore,
    planned: Normalized,
    entries: &[ScheduleEntry],
    config: &Config,
    privacy: Option<&PrivacyFilter>,
) -> RunOutcome {
    let Normalized {
        tasks,
        users,
        mut issues,
    } = planned;

    let cycles = extract_cycle_issues(entries, store, &mut issues, privacy);
    if cycles > 0 {
        info!("Scheduler reported {cycles} task(s) in dependency cycles");
    }

    // Everything flagged so far is unschedulable; at-risk comes after the diff.
    let unschedulable = issues.flagged();
    let updates = prepare_updates(
        entries,
        store,
        &unschedulable,
        &config.scheduling.on_hold_status,
        privacy,
    );
    issues.extend(detect_at_risk(&updates, store));

    RunOutcome {
        tasks,
        users,
        updates,
        issues: issues.into_sorted(),
    }
}

/// Plan, schedule and reconcile. A scheduler failure aborts the run.
pub fn run<S: Scheduler + ?Sized>(
    store: &mut WorkItemStore,
    scheduler: &S,
    config: &Config,
) -> Result<RunOutcome> {
    let privacy = privacy_filter(store, config);
    let planned = plan(store, config, Some(&privacy));
    let entries = scheduler
        .schedule(&planned.tasks, &planned.users)
        .map_err(|err| Error::ScheduleFailed(format!("{err:#}")))?;
    Ok(reconcile(store, planned, &entries, config, Some(&privacy)))
}
