#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use assert_cmd::Command;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use schedsync::item::{IssueRef, ItemState, ProjectLink, WorkItem};
use schedsync::schedule::ScheduleEntry;
use tempfile::TempDir;

pub const FIELD_NAMES: [&str; 5] = [
    "Expected Start",
    "Expected Completion",
    "98% Completion",
    "Low Estimate",
    "High Estimate",
];

/// Scratch directory holding snapshot, schedule and config files.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn write_snapshot(&self, items: &[WorkItem]) -> std::io::Result<PathBuf> {
        let body = serde_json::to_string_pretty(items).expect("serialize snapshot");
        self.write_file("items.json", &body)
    }

    pub fn write_schedule(&self, entries: &[ScheduleEntry]) -> std::io::Result<PathBuf> {
        let body = serde_json::to_string_pretty(entries).expect("serialize schedule");
        self.write_file("schedule.json", &body)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        self.write_file(".schedsync.toml", contents)
    }
}

/// In-memory sink for log lines emitted while a closure runs.
#[derive(Clone, Default)]
pub struct LogCapture {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Run `f` with a debug-level subscriber writing into this capture.
    pub fn capture<T>(&self, f: impl FnOnce() -> T) -> T {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn contents(&self) -> String {
        let buf = self.buf.lock().expect("log buffer");
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().expect("log buffer").extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn schedsync_cmd(dir: &TestDir) -> Command {
    let mut cmd = Command::cargo_bin("schedsync").expect("binary");
    cmd.current_dir(dir.path());
    cmd.env_remove("GITHUB_REPOSITORY");
    cmd.env_remove("SCHEDSYNC_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("date")
}

/// Midday UTC on the given day.
pub fn at(raw: &str) -> DateTime<Utc> {
    let day = date(raw);
    Utc.with_ymd_and_hms(
        chrono::Datelike::year(&day),
        chrono::Datelike::month(&day),
        chrono::Datelike::day(&day),
        12,
        0,
        0,
    )
    .single()
    .expect("datetime")
}

pub fn project_link(item_id: &str) -> ProjectLink {
    let field_ids: BTreeMap<String, String> = FIELD_NAMES
        .iter()
        .enumerate()
        .map(|(index, name)| (name.to_string(), format!("F{index}")))
        .collect();
    ProjectLink {
        project_id: "PROJ".to_string(),
        item_id: item_id.to_string(),
        field_ids,
    }
}

/// An open, estimated, unassigned issue in the project.
pub fn issue(owner: &str, repo: &str, number: u64) -> WorkItem {
    WorkItem {
        owner: owner.to_string(),
        repo: repo.to_string(),
        number: Some(number),
        title: format!("{owner}/{repo} issue {number}"),
        order: number as i64,
        low_estimate: Some(1.0),
        high_estimate: Some(3.0),
        has_estimates: true,
        project: Some(project_link(&format!("ITEM-{owner}-{repo}-{number}"))),
        ..Default::default()
    }
}

pub fn draft(slot: &str, order: i64) -> WorkItem {
    WorkItem {
        title: format!("draft {slot}"),
        order,
        is_draft: true,
        project_item_id: Some(slot.to_string()),
        project: Some(project_link(slot)),
        ..Default::default()
    }
}

pub fn closed(mut item: WorkItem) -> WorkItem {
    item.state = ItemState::Closed;
    item
}

pub fn on_hold(mut item: WorkItem) -> WorkItem {
    item.scheduling_status = Some("On Hold".to_string());
    item
}

pub fn blocked_by(mut item: WorkItem, blocker: &WorkItem) -> WorkItem {
    let number = blocker.number.expect("blocker number");
    item.blocked_by
        .push(IssueRef::new(blocker.owner.clone(), blocker.repo.clone(), number));
    item
}

pub fn with_dates(mut item: WorkItem, start: &str, mean: &str, p98: &str) -> WorkItem {
    item.expected_start = Some(date(start));
    item.expected_completion = Some(date(mean));
    item.completion_98 = Some(date(p98));
    item.has_scheduling_dates = true;
    item
}

pub fn without_estimates(mut item: WorkItem) -> WorkItem {
    item.low_estimate = None;
    item.high_estimate = None;
    item.has_estimates = false;
    item
}

pub fn entry(id: &str, start: &str, mean: &str, p98: &str) -> ScheduleEntry {
    ScheduleEntry {
        id: id.to_string(),
        name: String::new(),
        is_package: false,
        expected_start: Some(at(start)),
        mean_completion: Some(at(mean)),
        completion_98: Some(at(p98)),
        cycle: Vec::new(),
    }
}

pub fn package_entry(id: &str) -> ScheduleEntry {
    ScheduleEntry {
        id: id.to_string(),
        is_package: true,
        ..Default::default()
    }
}
