mod support;

use schedsync::config::{Config, FieldsConfig, SchedulingConfig};
use schedsync::issue::IssueReason;
use schedsync::store::WorkItemStore;
use schedsync::task::{normalize, Normalized, Task};

use support::{blocked_by, closed, draft, issue, on_hold, without_estimates};

fn run(items: Vec<schedsync::item::WorkItem>) -> Normalized {
    let store = WorkItemStore::from_items(items);
    normalize(&store, &Config::default(), None)
}

fn task<'a>(normalized: &'a Normalized, id: &str) -> &'a Task {
    normalized
        .tasks
        .iter()
        .find(|task| task.id == id)
        .expect("task present")
}

fn reasons(normalized: &Normalized, reference: &str) -> Vec<IssueReason> {
    normalized
        .issues
        .iter()
        .filter(|issue| issue.reference == reference)
        .map(|issue| issue.reason)
        .collect()
}

#[test]
fn dependencies_are_classified() {
    let absent = issue("acme", "app", 2);
    let held = on_hold(issue("acme", "app", 3));
    let done = closed(issue("acme", "app", 4));
    let real = issue("acme", "app", 5);
    let a = blocked_by(
        blocked_by(
            blocked_by(blocked_by(issue("acme", "app", 1), &absent), &held),
            &done,
        ),
        &real,
    );

    let normalized = run(vec![a, held, done, real]);

    let a = task(&normalized, "acme/app#1");
    assert_eq!(a.depends_on, vec!["acme/app#5".to_string()]);

    let reference = "github.com/acme/app/issues/1";
    let missing = normalized
        .issues
        .iter()
        .find(|i| i.reference == reference && i.reason == IssueReason::MissingDependency)
        .expect("missing dependency");
    assert_eq!(missing.details, vec!["acme/app#2".to_string()]);
    let held = normalized
        .issues
        .iter()
        .find(|i| i.reference == reference && i.reason == IssueReason::OnholdDependency)
        .expect("on-hold dependency");
    assert_eq!(held.details, vec!["acme/app#3".to_string()]);
    assert_eq!(reasons(&normalized, reference).len(), 2);
}

#[test]
fn drafts_count_as_on_hold() {
    let normalized = run(vec![draft("PVTI_1", 0)]);
    let task = task(&normalized, "draft:PVTI_1");
    assert!(task.on_hold);
    assert!(normalized.issues.is_empty());
}

#[test]
fn inactive_items_raise_no_diagnostics() {
    let ghost = issue("acme", "gone", 9);
    let held = blocked_by(without_estimates(on_hold(issue("acme", "app", 1))), &ghost);
    let mut done = blocked_by(without_estimates(closed(issue("acme", "app", 2))), &ghost);
    done.inaccessible_blockers = 2;

    let normalized = run(vec![held, done]);
    assert!(normalized.issues.is_empty());
}

#[test]
fn inaccessible_blockers_are_reported() {
    let mut item = issue("acme", "app", 1);
    item.inaccessible_blockers = 2;
    let normalized = run(vec![item]);

    let issue = normalized.issues.iter().next().expect("diagnostic");
    assert_eq!(issue.reason, IssueReason::InaccessibleDependency);
    assert_eq!(
        issue.details,
        vec!["2 blocker(s) from inaccessible repositories".to_string()]
    );
}

#[test]
fn missing_estimates_list_absent_fields_only() {
    let mut item = issue("acme", "app", 1);
    item.high_estimate = None;
    item.low_estimate = Some(0.0);
    let normalized = run(vec![item]);

    let issue = normalized.issues.iter().next().expect("diagnostic");
    assert_eq!(issue.reason, IssueReason::MissingEstimate);
    assert_eq!(issue.details, vec!["High Estimate".to_string()]);
    let task = task(&normalized, "acme/app#1");
    assert_eq!((task.estimate_low, task.estimate_high), (0.0, 0.0));
}

#[test]
fn defaults_apply_even_when_estimates_are_reported() {
    let normalized = run(vec![without_estimates(issue("acme", "app", 1))]);

    let task = task(&normalized, "acme/app#1");
    assert_eq!((task.estimate_low, task.estimate_high), (1.0, 4.0));
    let issue = normalized.issues.iter().next().expect("diagnostic");
    assert_eq!(issue.reason, IssueReason::MissingEstimate);
    assert_eq!(
        issue.details,
        vec!["Low Estimate".to_string(), "High Estimate".to_string()]
    );
}

#[test]
fn estimate_validity() {
    let mut inverted = issue("acme", "app", 1);
    inverted.low_estimate = Some(8.0);
    inverted.high_estimate = Some(4.0);
    let mut equal = issue("acme", "app", 2);
    equal.low_estimate = Some(4.0);
    equal.high_estimate = Some(4.0);
    let mut zero = issue("acme", "app", 3);
    zero.low_estimate = Some(0.0);
    zero.high_estimate = Some(0.0);

    let normalized = run(vec![inverted, equal, zero]);

    assert_eq!(normalized.issues.len(), 1);
    let issue = normalized.issues.iter().next().expect("diagnostic");
    assert_eq!(issue.reference, "github.com/acme/app/issues/1");
    assert_eq!(issue.reason, IssueReason::InvalidEstimate);
    assert_eq!(
        issue.details,
        vec!["High Estimate (4.0) must be greater than or equal to Low Estimate (8.0)".to_string()]
    );
}

#[test]
fn assignees_become_users() {
    let mut item = issue("acme", "app", 1);
    item.assignee = Some("riley".to_string());
    let normalized = run(vec![item, issue("acme", "app", 2)]);

    assert_eq!(task(&normalized, "acme/app#1").user, "riley");
    assert_eq!(task(&normalized, "acme/app#2").user, "unassigned");
    let users: Vec<&str> = normalized.users.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(users, vec!["riley", "unassigned"]);
}

#[test]
fn custom_on_hold_status_is_honored() {
    let mut parked = issue("acme", "app", 1);
    parked.scheduling_status = Some("Parked".to_string());
    let store = WorkItemStore::from_items(vec![parked]);
    let config = Config {
        scheduling: SchedulingConfig {
            on_hold_status: "Parked".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    let normalized = normalize(&store, &config, None);
    assert!(normalized.tasks[0].on_hold);
}

#[test]
fn package_ranks_reach_tasks() {
    let mut late = issue("acme", "app", 1);
    late.milestone = Some("v2.0.0".to_string());
    let mut early = issue("acme", "app", 2);
    early.milestone = Some("v1.0.0".to_string());
    let loose = issue("acme", "app", 3);

    let normalized = run(vec![late, early, loose]);

    assert_eq!(task(&normalized, "acme/app#2").package_order, 0);
    assert_eq!(task(&normalized, "acme/app#1").package_order, 1);
    let loose = task(&normalized, "acme/app#3");
    assert_eq!(loose.package_order, 2);
    assert!(loose.package_id.is_none());
}

#[test]
fn estimate_diagnostics_use_configured_field_names() {
    let mut missing = without_estimates(issue("acme", "app", 1));
    missing.high_estimate = Some(3.0);
    let mut inverted = issue("acme", "app", 2);
    inverted.low_estimate = Some(5.0);
    inverted.high_estimate = Some(2.0);
    let store = WorkItemStore::from_items(vec![missing, inverted]);
    let config = Config {
        fields: FieldsConfig {
            low_estimate: "Optimistic".to_string(),
            high_estimate: "Pessimistic".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    let issues = normalize(&store, &config, None).issues.into_sorted();

    assert_eq!(issues[0].reason, IssueReason::MissingEstimate);
    assert_eq!(issues[0].details, vec!["Optimistic".to_string()]);
    assert_eq!(issues[1].reason, IssueReason::InvalidEstimate);
    assert_eq!(
        issues[1].details,
        vec!["Pessimistic (2.0) must be greater than or equal to Optimistic (5.0)".to_string()]
    );
}
