//! schedsync plan command implementation
//!
//! Builds the scheduler input from a project snapshot and reports which
//! items cannot be scheduled yet.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::Config;
use crate::engine;
use crate::error::Result;
use crate::issue::SchedulingIssue;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::WorkItemStore;
use crate::task::{Task, User};

/// Options for the plan command
pub struct PlanOptions {
    pub items: PathBuf,
    pub out: Option<PathBuf>,
    pub config: Config,
    pub json: bool,
    pub quiet: bool,
}

/// What the external scheduler consumes.
#[derive(Serialize)]
struct SchedulerInput<'a> {
    tasks: &'a [Task],
    users: &'a [User],
}

#[derive(Serialize)]
struct PlanReport {
    tasks: Vec<Task>,
    users: Vec<User>,
    issues: Vec<SchedulingIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    out: Option<PathBuf>,
}

pub fn run(options: PlanOptions) -> Result<()> {
    let mut store = WorkItemStore::load_snapshot(&options.items)?;
    let privacy = engine::privacy_filter(&store, &options.config);
    let planned = engine::plan(&mut store, &options.config, Some(&privacy));

    if let Some(out) = &options.out {
        let input = SchedulerInput {
            tasks: &planned.tasks,
            users: &planned.users,
        };
        std::fs::write(out, serde_json::to_string_pretty(&input)?)?;
    }

    let issues: Vec<SchedulingIssue> = planned
        .issues
        .into_sorted()
        .iter()
        .map(|issue| privacy.redact_issue(issue))
        .collect();

    let scheduled = planned
        .tasks
        .iter()
        .filter(|task| !task.done && !task.on_hold)
        .count();
    let mut human = HumanOutput::new(format!(
        "schedsync plan: {} task(s), {} user(s)",
        planned.tasks.len(),
        planned.users.len()
    ));
    human.push_summary("active", scheduled);
    human.push_summary("diagnostics", issues.len());
    if let Some(out) = &options.out {
        human.push_summary("scheduler input", out.display());
    }
    for issue in &issues {
        human.push_warning(super::issue_line(&privacy, issue));
    }
    if options.out.is_none() {
        human.push_next_step("schedsync plan --items <snapshot.json> --out <input.json>");
    }

    let report = PlanReport {
        tasks: planned.tasks,
        users: planned.users,
        issues,
        out: options.out,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "plan",
        &report,
        Some(&human),
    )
}
