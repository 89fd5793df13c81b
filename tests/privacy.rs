mod support;

use schedsync::config::Config;
use schedsync::engine;
use schedsync::issue::{IssueReason, SchedulingIssue};
use schedsync::item::IssueRef;
use schedsync::privacy::PrivacyFilter;
use schedsync::schedule::ScheduleEntry;
use schedsync::store::WorkItemStore;
use schedsync::task::{Task, User};

use support::{blocked_by, entry, issue, with_dates, LogCapture};

fn store() -> WorkItemStore {
    let mut own = issue("acme", "app", 1);
    own.is_private = true;
    let mut secret = issue("acme", "secret", 2);
    secret.is_private = true;
    let open = issue("acme", "public", 3);
    WorkItemStore::from_items(vec![own, secret, open])
}

#[test]
fn only_foreign_private_repos_are_redacted() {
    let filter = PrivacyFilter::new(Some("acme/app"), &store());

    assert!(!filter.should_redact("acme", "app"));
    assert!(filter.should_redact("acme", "secret"));
    assert!(!filter.should_redact("acme", "public"));
}

#[test]
fn helpers_use_the_placeholder() {
    let filter = PrivacyFilter::new(Some("acme/app"), &store());

    assert_eq!(filter.redact_repo("acme", "secret"), "[private]");
    assert_eq!(filter.redact_repo("acme", "public"), "acme/public");
    assert_eq!(filter.redact_ref("acme", "secret", 2), "[private] #2");
    assert_eq!(filter.redact_ref("acme", "app", 1), "acme/app #1");
    assert_eq!(filter.redact_title("acme", "secret", "Launch plan"), "[private]");
    assert_eq!(filter.redact_title("acme", "app", "Launch plan"), "Launch plan");
    assert_eq!(filter.redact_dep_id("acme/secret#2"), "[private]#2");
    assert_eq!(filter.redact_dep_id("acme/app#1"), "acme/app#1");
}

#[test]
fn issue_details_are_redacted_but_keys_are_kept() {
    let filter = PrivacyFilter::new(Some("acme/app"), &store());
    let item = issue("acme", "app", 1);
    let original = SchedulingIssue::for_item(
        "github.com/acme/app/issues/1",
        &item,
        IssueReason::OnholdDependency,
        vec!["acme/secret#2".to_string(), "acme/public#3".to_string()],
    );

    let redacted = filter.redact_issue(&original);

    assert_eq!(
        redacted.details,
        vec!["[private]#2".to_string(), "acme/public#3".to_string()]
    );
    assert_eq!(redacted.reference, original.reference);
    assert_eq!(original.details[0], "acme/secret#2");
}

#[test]
fn free_text_details_pass_through() {
    let filter = PrivacyFilter::new(Some("acme/app"), &store());
    assert_eq!(
        filter.redact_dep_id("2 blocker(s) from inaccessible repositories"),
        "2 blocker(s) from inaccessible repositories"
    );
    assert_eq!(filter.redact_dep_id("Due Date: 2025-03-15"), "Due Date: 2025-03-15");
}

#[test]
fn run_logs_never_name_foreign_private_items() -> Result<(), Box<dyn std::error::Error>> {
    let gone = issue("acme", "gone", 9);
    let mut stuck = blocked_by(issue("acme", "secret", 5), &gone);
    stuck.is_private = true;
    let mut current = with_dates(
        issue("acme", "secret", 6),
        "2025-03-03",
        "2025-03-05",
        "2025-03-10",
    );
    current.is_private = true;
    let mut upstream = issue("acme", "secret", 7);
    upstream.is_private = true;
    upstream.blocking.push(IssueRef::new("acme", "secret", 6));

    let mut store = WorkItemStore::from_items(vec![stuck, current, upstream]);
    let mut config = Config::default();
    config.privacy.current_repo = Some("acme/app".to_string());
    let scheduler = |_tasks: &[Task], _users: &[User]| -> anyhow::Result<Vec<ScheduleEntry>> {
        Ok(vec![
            entry("acme/secret#6", "2025-03-03", "2025-03-05", "2025-03-10"),
            entry("acme/secret#8", "2025-03-03", "2025-03-05", "2025-03-10"),
        ])
    };

    let logs = LogCapture::default();
    logs.capture(|| engine::run(&mut store, &scheduler, &config))?;
    let out = logs.contents();

    assert!(out.contains("Skipping dependency acme/gone#9 for [private]#5"), "{out}");
    assert!(out.contains("[private]#6 blocked by [private]#7"), "{out}");
    assert!(out.contains("Dates unchanged for [private]#6"), "{out}");
    assert!(out.contains("No work item found for task [private]#8"), "{out}");
    assert!(!out.contains("acme/secret"), "{out}");
    Ok(())
}
