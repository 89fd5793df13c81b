//! Applying date updates through the tracker's field-write API.
//!
//! Writes go field by field. A failed field is logged and counted; it never
//! stops the remaining fields or updates. [`JsonlWriter`] records field and
//! comment writes as JSON lines.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::comment::CommentWriter;
use crate::config::FieldsConfig;
use crate::error::{Error, Result};
use crate::issue::SchedulingIssue;
use crate::item::ProjectLink;
use crate::privacy::PrivacyFilter;
use crate::reconcile::{DateUpdate, UpdateAction};

pub const WRITE_SCHEMA_VERSION: &str = "schedsync.write.v1";

/// Field-level writes against a project item.
pub trait FieldWriter {
    fn clear_field(&mut self, project_id: &str, item_id: &str, field_id: &str)
        -> anyhow::Result<()>;

    fn set_date_field(
        &mut self,
        project_id: &str,
        item_id: &str,
        field_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<()>;
}

/// Field counts for a single update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldCounts {
    pub written: usize,
    pub failed: usize,
    /// Fields the project does not define.
    pub missing: usize,
}

/// Totals across a batch of updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    /// Updates with every field written.
    pub applied: usize,
    /// Updates with at least one failed field.
    pub failed: usize,
    pub fields_written: usize,
    pub fields_failed: usize,
}

fn update_label(update: &DateUpdate, privacy: Option<&PrivacyFilter>) -> String {
    match (update.number, privacy) {
        (Some(number), Some(filter)) => filter.redact_ref(&update.owner, &update.repo, number),
        (Some(number), None) => format!("{}/{} #{}", update.owner, update.repo, number),
        (None, _) => update.reference.clone(),
    }
}

/// Apply one update. Clears always cover the three date fields, and the
/// estimate fields only when the item was closed.
pub fn apply_update<W: FieldWriter + ?Sized>(
    writer: &mut W,
    update: &DateUpdate,
    fields: &FieldsConfig,
    privacy: Option<&PrivacyFilter>,
) -> FieldCounts {
    let project: &ProjectLink = &update.project;
    let label = update_label(update, privacy);
    let mut counts = FieldCounts::default();

    match &update.action {
        UpdateAction::Clear { reason } => {
            let mut names: Vec<&str> = fields.date_fields().to_vec();
            if reason.clears_estimates() {
                names.extend(fields.estimate_fields());
            }
            for name in names {
                let Some(field_id) = project.field_id(name) else {
                    debug!("No '{}' field found for {}", name, label);
                    counts.missing += 1;
                    continue;
                };
                match writer.clear_field(&project.project_id, &project.item_id, field_id) {
                    Ok(()) => counts.written += 1,
                    Err(err) => {
                        warn!("Failed to clear {} for {}: {:#}", name, label, err);
                        counts.failed += 1;
                    }
                }
            }
        }
        UpdateAction::SetDates {
            expected_start,
            mean_completion,
            completion_98,
        } => {
            let targets = [
                (fields.expected_start.as_str(), expected_start),
                (fields.expected_completion.as_str(), mean_completion),
                (fields.completion_98.as_str(), completion_98),
            ];
            for (name, value) in targets {
                let Some(value) = value else {
                    continue;
                };
                let Some(field_id) = project.field_id(name) else {
                    debug!("No '{}' field found for {}", name, label);
                    counts.missing += 1;
                    continue;
                };
                match writer.set_date_field(
                    &project.project_id,
                    &project.item_id,
                    field_id,
                    value.date_naive(),
                ) {
                    Ok(()) => counts.written += 1,
                    Err(err) => {
                        warn!("Failed to update {} for {}: {:#}", name, label, err);
                        counts.failed += 1;
                    }
                }
            }
        }
    }
    counts
}

pub fn apply_updates<W: FieldWriter + ?Sized>(
    writer: &mut W,
    updates: &[DateUpdate],
    fields: &FieldsConfig,
    privacy: Option<&PrivacyFilter>,
) -> ApplySummary {
    let mut summary = ApplySummary::default();
    for update in updates {
        let counts = apply_update(writer, update, fields, privacy);
        summary.fields_written += counts.written;
        summary.fields_failed += counts.failed;
        if counts.failed == 0 {
            summary.applied += 1;
        } else {
            summary.failed += 1;
        }
    }
    summary
}

#[derive(Debug, Clone)]
pub enum WriteDestination {
    Stdout,
    File(PathBuf),
}

impl WriteDestination {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed == "-" {
                return Some(WriteDestination::Stdout);
            }
            Some(WriteDestination::File(PathBuf::from(trimmed)))
        })
    }

    pub fn open(&self) -> Result<JsonlWriter> {
        match self {
            WriteDestination::Stdout => Ok(JsonlWriter::stdout()),
            WriteDestination::File(path) => JsonlWriter::file(path),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldOp {
    Clear,
    SetDate { date: NaiveDate },
}

/// One field write as recorded in the log.
#[derive(Debug, Clone, Serialize)]
pub struct FieldWrite {
    pub schema_version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub project_id: String,
    pub item_id: String,
    pub field_id: String,
    #[serde(flatten)]
    pub op: FieldOp,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CommentOp {
    UpsertComment {
        #[serde(skip_serializing_if = "Option::is_none")]
        comment_id: Option<u64>,
        issues: Vec<SchedulingIssue>,
    },
    DeleteComment {
        comment_id: u64,
    },
}

/// One comment write as recorded in the log.
#[derive(Debug, Clone, Serialize)]
pub struct CommentWrite {
    pub schema_version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub owner: String,
    pub repo: String,
    pub number: u64,
    #[serde(flatten)]
    pub op: CommentOp,
}

/// Records every field and comment write as a JSON line.
pub struct JsonlWriter {
    writer: Box<dyn Write + Send>,
}

impl JsonlWriter {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Append to a file, creating it if necessary.
    pub fn file(path: &Path) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::new(Box::new(file)))
    }

    fn emit<T: Serialize>(&mut self, record: &T) -> Result<()> {
        let serialized = serde_json::to_vec(record)?;
        self.writer.write_all(&serialized)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush().map_err(Error::Io)?;
        Ok(())
    }

    fn record_comment(&mut self, owner: &str, repo: &str, number: u64, op: CommentOp) -> Result<()> {
        self.emit(&CommentWrite {
            schema_version: WRITE_SCHEMA_VERSION,
            timestamp: Utc::now(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            number,
            op,
        })
    }

    fn record(&mut self, project_id: &str, item_id: &str, field_id: &str, op: FieldOp) -> Result<()> {
        self.emit(&FieldWrite {
            schema_version: WRITE_SCHEMA_VERSION,
            timestamp: Utc::now(),
            project_id: project_id.to_string(),
            item_id: item_id.to_string(),
            field_id: field_id.to_string(),
            op,
        })
    }
}

impl FieldWriter for JsonlWriter {
    fn clear_field(
        &mut self,
        project_id: &str,
        item_id: &str,
        field_id: &str,
    ) -> anyhow::Result<()> {
        self.record(project_id, item_id, field_id, FieldOp::Clear)?;
        Ok(())
    }

    fn set_date_field(
        &mut self,
        project_id: &str,
        item_id: &str,
        field_id: &str,
        date: NaiveDate,
    ) -> anyhow::Result<()> {
        self.record(project_id, item_id, field_id, FieldOp::SetDate { date })?;
        Ok(())
    }
}

impl CommentWriter for JsonlWriter {
    fn upsert_comment(
        &mut self,
        owner: &str,
        repo: &str,
        number: u64,
        existing: Option<u64>,
        issues: &[SchedulingIssue],
    ) -> anyhow::Result<()> {
        let op = CommentOp::UpsertComment {
            comment_id: existing,
            issues: issues.to_vec(),
        };
        self.record_comment(owner, repo, number, op)?;
        Ok(())
    }

    fn delete_comment(
        &mut self,
        owner: &str,
        repo: &str,
        number: u64,
        comment_id: u64,
    ) -> anyhow::Result<()> {
        self.record_comment(owner, repo, number, CommentOp::DeleteComment { comment_id })?;
        Ok(())
    }
}
