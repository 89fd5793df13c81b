//! schedsync init command implementation
//!
//! Writes a default `.schedsync.toml` so field names and scheduling defaults
//! can be edited in place.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::{validate_repo_slug, Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};

/// Options for the init command
pub struct InitOptions {
    /// Target file; `./.schedsync.toml` when absent.
    pub path: Option<PathBuf>,
    pub current_repo: Option<String>,
    pub force: bool,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct InitReport {
    path: PathBuf,
    created: bool,
}

pub fn run(options: InitOptions) -> Result<()> {
    let path = match options.path {
        Some(path) => path,
        None => std::env::current_dir()?.join(CONFIG_FILE),
    };

    if path.exists() && !path.is_file() {
        return Err(Error::InvalidArgument(format!(
            "{} exists but is not a file",
            path.display()
        )));
    }

    let created = if path.exists() && !options.force {
        false
    } else {
        let mut config = Config::default();
        if let Some(repo) = options
            .current_repo
            .as_deref()
            .map(str::trim)
            .filter(|repo| !repo.is_empty())
        {
            validate_repo_slug(repo, "--current-repo")?;
            config.privacy.current_repo = Some(repo.to_string());
        }
        config.save(&path)?;
        true
    };

    let header = if created {
        "schedsync init: wrote config"
    } else {
        "schedsync init: nothing to do"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("config", path.display());
    if created {
        human.push_next_step("edit [fields] to match the project's field names");
    } else {
        human.push_next_step("rerun with --force to overwrite the existing config");
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "init",
        &InitReport { path, created },
        Some(&human),
    )
}
