//! Cycle diagnostics from scheduler output.

use std::collections::HashMap;

use tracing::debug;

use crate::issue::{Diagnostics, IssueReason, SchedulingIssue};
use crate::privacy::{task_id_for_log, PrivacyFilter};
use crate::schedule::ScheduleEntry;
use crate::store::WorkItemStore;

/// Raise a `cycle` diagnostic for every scheduled task caught in a loop.
///
/// Items that already hold a diagnostic of any kind are left alone, so an
/// item reports the root cause the normalizer found rather than a cycle on
/// top of it. Returns the number of diagnostics added.
pub fn extract_cycle_issues(
    entries: &[ScheduleEntry],
    store: &WorkItemStore,
    issues: &mut Diagnostics,
    privacy: Option<&PrivacyFilter>,
) -> usize {
    let task_index: HashMap<String, String> = store.task_index();
    let mut added = 0;

    for entry in entries {
        if entry.is_package || !entry.has_cycle() {
            continue;
        }
        let Some(reference) = task_index.get(&entry.id) else {
            debug!(
                "No work item found for cycle entry {}",
                task_id_for_log(privacy, &entry.id)
            );
            continue;
        };
        if issues.has_any(reference) {
            continue;
        }
        let Some(item) = store.get(reference) else {
            continue;
        };
        if issues.push(SchedulingIssue::for_item(
            reference.as_str(),
            item,
            IssueReason::Cycle,
            entry.cycle.clone(),
        )) {
            added += 1;
        }
    }
    added
}
