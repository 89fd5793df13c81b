//! schedsync reconcile command implementation
//!
//! Diffs scheduler output against the project snapshot and records the
//! resulting field and scheduling-comment writes.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::apply::{apply_updates, ApplySummary, WriteDestination};
use crate::comment::{apply_comments, plan_comments, CommentSummary, CommentUpdate};
use crate::config::Config;
use crate::engine;
use crate::error::{Error, Result};
use crate::issue::SchedulingIssue;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::privacy::PrivacyFilter;
use crate::reconcile::{DateUpdate, UpdateAction};
use crate::schedule::RecordedSchedule;
use crate::store::WorkItemStore;

/// Options for the reconcile command
pub struct ReconcileOptions {
    pub items: PathBuf,
    pub schedule: PathBuf,
    pub writes: String,
    pub dry_run: bool,
    pub config: Config,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct ReconcileReport {
    updates: Vec<DateUpdate>,
    issues: Vec<SchedulingIssue>,
    comments: Vec<CommentUpdate>,
    dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<ApplySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comments_applied: Option<CommentSummary>,
}

pub fn run(options: ReconcileOptions) -> Result<()> {
    let destination = if options.dry_run {
        None
    } else {
        let destination = WriteDestination::parse(Some(options.writes.as_str())).ok_or_else(|| {
            Error::InvalidArgument("--writes cannot be empty".to_string())
        })?;
        if options.json && matches!(destination, WriteDestination::Stdout) {
            return Err(Error::InvalidArgument(
                "--writes - cannot be combined with --json".to_string(),
            ));
        }
        Some(destination)
    };

    let mut store = WorkItemStore::load_snapshot(&options.items)?;
    let schedule = RecordedSchedule::load(&options.schedule)?;
    let outcome = engine::run(&mut store, &schedule, &options.config)?;
    let privacy = engine::privacy_filter(&store, &options.config);

    let issues: Vec<SchedulingIssue> = outcome
        .issues
        .iter()
        .map(|issue| privacy.redact_issue(issue))
        .collect();
    let comments = plan_comments(&store, &issues);

    let (applied, comments_applied) = match &destination {
        Some(destination) => {
            let mut writer = destination.open()?;
            let fields = apply_updates(
                &mut writer,
                &outcome.updates,
                &options.config.fields,
                Some(&privacy),
            );
            let posted = apply_comments(&mut writer, &comments, Some(&privacy));
            (Some(fields), Some(posted))
        }
        None => (None, None),
    };

    let clears = outcome.updates.iter().filter(|u| u.is_clear()).count();
    let header = if options.dry_run {
        format!("schedsync reconcile: {} update(s) (dry run)", outcome.updates.len())
    } else {
        format!("schedsync reconcile: {} update(s)", outcome.updates.len())
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("set", outcome.updates.len() - clears);
    human.push_summary("clear", clears);
    human.push_summary("diagnostics", issues.len());
    human.push_summary("comments", comments.len());
    if let Some(summary) = &applied {
        human.push_summary("fields written", summary.fields_written);
        if summary.failed > 0 {
            human.push_warning(format!(
                "{} update(s) had failed field writes ({} field(s))",
                summary.failed, summary.fields_failed
            ));
        }
    }
    if let Some(summary) = &comments_applied {
        if summary.failed > 0 {
            human.push_warning(format!(
                "{} scheduling comment write(s) failed",
                summary.failed
            ));
        }
    }
    for update in &outcome.updates {
        human.push_detail(update_line(&privacy, update));
    }
    for comment in &comments {
        human.push_detail(comment_line(&privacy, comment));
    }
    for issue in &issues {
        human.push_warning(super::issue_line(&privacy, issue));
    }
    if options.dry_run && !(outcome.updates.is_empty() && comments.is_empty()) {
        human.push_next_step("rerun without --dry-run to record the writes");
    }

    let report = ReconcileReport {
        updates: outcome.updates,
        issues,
        comments,
        dry_run: options.dry_run,
        applied,
        comments_applied,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "reconcile",
        &report,
        Some(&human),
    )
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn update_line(privacy: &PrivacyFilter, update: &DateUpdate) -> String {
    let label = super::item_label(
        privacy,
        &update.reference,
        &update.owner,
        &update.repo,
        update.number,
    );
    match &update.action {
        UpdateAction::Clear { reason } => format!("{label}: clear ({reason})"),
        UpdateAction::SetDates {
            expected_start,
            mean_completion,
            completion_98,
        } => format!(
            "{label}: start {}, expected {}, 98% {}",
            format_date(*expected_start),
            format_date(*mean_completion),
            format_date(*completion_98)
        ),
    }
}

fn comment_line(privacy: &PrivacyFilter, comment: &CommentUpdate) -> String {
    let label = privacy.redact_ref(&comment.owner, &comment.repo, comment.number);
    if comment.is_delete() {
        format!("{label}: delete scheduling comment")
    } else {
        format!("{label}: post scheduling comment")
    }
}
