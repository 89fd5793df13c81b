//! Command-line interface for schedsync
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::{validate_repo_slug, Config};
use crate::error::Result;
use crate::issue::SchedulingIssue;
use crate::privacy::PrivacyFilter;

mod init;
mod plan;
mod reconcile;

/// schedsync - keep project schedule fields in step with a task scheduler
///
/// Turns a project snapshot into scheduler input, then reconciles the
/// scheduler's output back into the minimal set of field writes.
#[derive(Parser, Debug)]
#[command(name = "schedsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file (defaults to ./.schedsync.toml)
    #[arg(long, global = true, env = "SCHEDSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Repository the run belongs to (owner/repo); never redacted
    #[arg(long, global = true, env = "GITHUB_REPOSITORY")]
    pub current_repo: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default .schedsync.toml (or the --config path)
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Build scheduler input (tasks, users) and report unschedulable items
    Plan {
        /// Project snapshot: JSON array of work items
        #[arg(long)]
        items: PathBuf,

        /// Write the scheduler input to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Reconcile scheduler output into field writes
    Reconcile {
        /// Project snapshot: JSON array of work items
        #[arg(long)]
        items: PathBuf,

        /// Scheduler output: JSON array of schedule entries
        #[arg(long)]
        schedule: PathBuf,

        /// Field-write log (JSON lines); "-" for stdout
        #[arg(long, default_value = "schedsync-writes.jsonl")]
        writes: String,

        /// Compute updates without writing them
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let Cli {
            config: config_path,
            current_repo,
            json,
            quiet,
            command,
        } = self;

        match command {
            Commands::Init { force } => init::run(init::InitOptions {
                path: config_path,
                current_repo,
                force,
                json,
                quiet,
            }),
            Commands::Plan { items, out } => plan::run(plan::PlanOptions {
                items,
                out,
                config: load_config(config_path.as_deref(), current_repo.as_deref())?,
                json,
                quiet,
            }),
            Commands::Reconcile {
                items,
                schedule,
                writes,
                dry_run,
            } => reconcile::run(reconcile::ReconcileOptions {
                items,
                schedule,
                writes,
                dry_run,
                config: load_config(config_path.as_deref(), current_repo.as_deref())?,
                json,
                quiet,
            }),
        }
    }
}

/// Load the config file, then apply the `--current-repo` override.
fn load_config(path: Option<&Path>, current_repo: Option<&str>) -> Result<Config> {
    let mut config = match path {
        Some(path) => {
            if !path.exists() {
                return Err(crate::error::Error::InvalidArgument(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            Config::load(path)?
        }
        None => {
            let cwd = std::env::current_dir()?;
            Config::load_from_dir(&cwd)?
        }
    };

    if let Some(repo) = current_repo.map(str::trim).filter(|repo| !repo.is_empty()) {
        validate_repo_slug(repo, "--current-repo")?;
        config.privacy.current_repo = Some(repo.to_string());
    }
    Ok(config)
}

/// `owner/repo #N` (possibly redacted), or the draft key.
fn item_label(
    privacy: &PrivacyFilter,
    reference: &str,
    owner: &str,
    repo: &str,
    number: Option<u64>,
) -> String {
    match number {
        Some(number) => privacy.redact_ref(owner, repo, number),
        None => reference.to_string(),
    }
}

/// One human-readable line per diagnostic. Expects already-redacted details.
fn issue_line(privacy: &PrivacyFilter, issue: &SchedulingIssue) -> String {
    let label = item_label(privacy, &issue.reference, &issue.owner, &issue.repo, issue.number);
    if issue.details.is_empty() {
        format!("{label}: {}", issue.reason)
    } else {
        format!("{label}: {} ({})", issue.reason, issue.details.join(", "))
    }
}
