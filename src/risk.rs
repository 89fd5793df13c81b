//! At-risk detection: projected completion after the item's due date.

use crate::issue::{IssueReason, SchedulingIssue};
use crate::reconcile::DateUpdate;
use crate::store::WorkItemStore;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Flag set-date writes whose mean completion lands after the due date.
///
/// Compares calendar days; finishing on the due date is on time. Clears are
/// never considered, so unschedulable items cannot be at risk.
pub fn detect_at_risk(updates: &[DateUpdate], store: &WorkItemStore) -> Vec<SchedulingIssue> {
    let mut at_risk = Vec::new();
    for update in updates {
        let Some(mean_completion) = update.mean_completion() else {
            continue;
        };
        let Some(item) = store.get(&update.reference) else {
            continue;
        };
        let Some(due) = item.due_date else {
            continue;
        };
        let completion = mean_completion.date_naive();
        if completion <= due {
            continue;
        }
        at_risk.push(SchedulingIssue::for_item(
            update.reference.as_str(),
            item,
            IssueReason::AtRisk,
            vec![
                format!("Due Date: {}", due.format(DATE_FORMAT)),
                format!("Expected Completion: {}", completion.format(DATE_FORMAT)),
            ],
        ));
    }
    at_risk
}
