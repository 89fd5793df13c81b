//! Scheduler collaborator interface.
//!
//! The scheduler is a black box: tasks and users in, one entry per task (and
//! per package) out. Its failures are opaque to the engine.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::task::{Task, User};

/// One row of scheduler output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleEntry {
    /// Task id, or package id for grouping rows.
    pub id: String,
    pub name: String,
    /// Grouping rows carry no dates of their own.
    pub is_package: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_start: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_completion: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_98: Option<DateTime<Utc>>,
    /// Task ids forming a dependency loop through this task, first id repeated last.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cycle: Vec<String>,
}

impl ScheduleEntry {
    pub fn has_cycle(&self) -> bool {
        !self.cycle.is_empty()
    }
}

pub trait Scheduler {
    fn schedule(&self, tasks: &[Task], users: &[User]) -> anyhow::Result<Vec<ScheduleEntry>>;
}

impl<F> Scheduler for F
where
    F: Fn(&[Task], &[User]) -> anyhow::Result<Vec<ScheduleEntry>>,
{
    fn schedule(&self, tasks: &[Task], users: &[User]) -> anyhow::Result<Vec<ScheduleEntry>> {
        self(tasks, users)
    }
}

/// Scheduler output computed elsewhere and saved as a JSON array.
#[derive(Debug, Clone, Default)]
pub struct RecordedSchedule {
    entries: Vec<ScheduleEntry>,
}

impl RecordedSchedule {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::InvalidArgument(format!(
                "schedule file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<ScheduleEntry> = serde_json::from_str(&content)?;
        Ok(Self { entries })
    }
}

impl Scheduler for RecordedSchedule {
    /// Replays the recorded entries; the task list is not consulted.
    fn schedule(&self, _tasks: &[Task], _users: &[User]) -> anyhow::Result<Vec<ScheduleEntry>> {
        Ok(self.entries.clone())
    }
}
