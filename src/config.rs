//! Configuration loading and management
//!
//! Handles parsing of `.schedsync.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = ".schedsync.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Project custom field names
    #[serde(default)]
    pub fields: FieldsConfig,

    /// Normalization defaults
    #[serde(default)]
    pub scheduling: SchedulingConfig,

    /// Redaction of other private repositories in output
    #[serde(default)]
    pub privacy: PrivacyConfig,
}

/// Names of the project fields the scheduler reads and writes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsConfig {
    #[serde(default = "default_expected_start")]
    pub expected_start: String,

    #[serde(default = "default_expected_completion")]
    pub expected_completion: String,

    #[serde(default = "default_completion_98")]
    pub completion_98: String,

    #[serde(default = "default_low_estimate")]
    pub low_estimate: String,

    #[serde(default = "default_high_estimate")]
    pub high_estimate: String,
}

fn default_expected_start() -> String {
    "Expected Start".to_string()
}

fn default_expected_completion() -> String {
    "Expected Completion".to_string()
}

fn default_completion_98() -> String {
    "98% Completion".to_string()
}

fn default_low_estimate() -> String {
    "Low Estimate".to_string()
}

fn default_high_estimate() -> String {
    "High Estimate".to_string()
}

impl Default for FieldsConfig {
    fn default() -> Self {
        Self {
            expected_start: default_expected_start(),
            expected_completion: default_expected_completion(),
            completion_98: default_completion_98(),
            low_estimate: default_low_estimate(),
            high_estimate: default_high_estimate(),
        }
    }
}

impl FieldsConfig {
    /// The three computed date fields.
    pub fn date_fields(&self) -> [&str; 3] {
        [
            self.expected_start.as_str(),
            self.expected_completion.as_str(),
            self.completion_98.as_str(),
        ]
    }

    pub fn estimate_fields(&self) -> [&str; 2] {
        [self.low_estimate.as_str(), self.high_estimate.as_str()]
    }

    fn validate(&self) -> crate::error::Result<()> {
        let mut seen = std::collections::HashSet::new();
        for name in self.date_fields().into_iter().chain(self.estimate_fields()) {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(crate::error::Error::InvalidConfig(
                    "fields: names cannot be empty".to_string(),
                ));
            }
            if !seen.insert(trimmed) {
                return Err(crate::error::Error::InvalidConfig(format!(
                    "fields: duplicate field name '{trimmed}'"
                )));
            }
        }
        Ok(())
    }
}

/// Defaults applied while turning work items into scheduler tasks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Scheduling status value that puts an item on hold
    #[serde(default = "default_on_hold_status")]
    pub on_hold_status: String,

    /// Low estimate used when an open item has neither estimate
    #[serde(default = "default_low")]
    pub default_low_estimate: f64,

    /// High estimate used when an open item has neither estimate
    #[serde(default = "default_high")]
    pub default_high_estimate: f64,

    /// Resource that owns unassigned tasks
    #[serde(default = "default_unassigned_user")]
    pub unassigned_user: String,

    /// Working hours per weekday for every resource
    #[serde(default = "default_weekday_hours")]
    pub weekday_hours: f64,
}

fn default_on_hold_status() -> String {
    "On Hold".to_string()
}

fn default_low() -> f64 {
    1.0
}

fn default_high() -> f64 {
    4.0
}

fn default_unassigned_user() -> String {
    "unassigned".to_string()
}

fn default_weekday_hours() -> f64 {
    8.0
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            on_hold_status: default_on_hold_status(),
            default_low_estimate: default_low(),
            default_high_estimate: default_high(),
            unassigned_user: default_unassigned_user(),
            weekday_hours: default_weekday_hours(),
        }
    }
}

impl SchedulingConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.on_hold_status.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "scheduling.on_hold_status cannot be empty".to_string(),
            ));
        }
        if self.default_low_estimate < 0.0 || self.default_high_estimate < 0.0 {
            return Err(crate::error::Error::InvalidConfig(
                "scheduling default estimates must be >= 0".to_string(),
            ));
        }
        if self.default_high_estimate < self.default_low_estimate {
            return Err(crate::error::Error::InvalidConfig(format!(
                "scheduling.default_high_estimate ({}) must be >= default_low_estimate ({})",
                self.default_high_estimate, self.default_low_estimate
            )));
        }
        if self.unassigned_user.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "scheduling.unassigned_user cannot be empty".to_string(),
            ));
        }
        if !(0.0..=24.0).contains(&self.weekday_hours) {
            return Err(crate::error::Error::InvalidConfig(format!(
                "scheduling.weekday_hours must be within 0..=24, got {}",
                self.weekday_hours
            )));
        }
        Ok(())
    }
}

/// Privacy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrivacyConfig {
    /// Repository the run belongs to (`owner/repo`); its own items are never redacted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_repo: Option<String>,
}

impl PrivacyConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if let Some(repo) = &self.current_repo {
            validate_repo_slug(repo, "privacy.current_repo")?;
        }
        Ok(())
    }
}

/// Check that a value looks like `owner/repo`.
pub fn validate_repo_slug(value: &str, field: &str) -> crate::error::Result<()> {
    match value.split_once('/') {
        Some((owner, repo))
            if !owner.trim().is_empty() && !repo.trim().is_empty() && !repo.contains('/') =>
        {
            Ok(())
        }
        _ => Err(crate::error::Error::InvalidConfig(format!(
            "{field}: expected owner/repo, got '{value}'"
        ))),
    }
}

impl Config {
    /// Load configuration from a `.schedsync.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults when the file is absent
    pub fn load_from_dir(dir: &Path) -> crate::error::Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        self.fields.validate()?;
        self.scheduling.validate()?;
        self.privacy.validate()?;
        Ok(())
    }
}
