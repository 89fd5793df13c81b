//! Error types for schedsync
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, bad config, missing snapshot)
//! - 3: Fetch failed (the work item set could not be read at all)
//! - 4: Operation failed (scheduler failure, I/O, serialization)
//!
//! Conditions that keep an item from being scheduled are not errors; they are
//! reported as [`crate::issue::SchedulingIssue`] records.

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the schedsync CLI
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const FETCH_FAILED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for schedsync operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(PathBuf),

    // Fetch failures (exit code 3)
    #[error("Failed to fetch work items: {0}")]
    FetchFailed(String),

    // Operation failures (exit code 4)
    #[error("Scheduling failed: {0}")]
    ScheduleFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::InvalidConfig(_) | Error::InvalidArgument(_) | Error::SnapshotNotFound(_) => {
                exit_codes::USER_ERROR
            }

            // Fetch failures
            Error::FetchFailed(_) => exit_codes::FETCH_FAILED,

            // Operation failures
            Error::ScheduleFailed(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Error class reported in the JSON envelope.
    pub fn kind(&self) -> &'static str {
        match self.exit_code() {
            exit_codes::USER_ERROR => "user_error",
            exit_codes::FETCH_FAILED => "fetch_failed",
            _ => "operation_failed",
        }
    }

    /// Structured details for the JSON error envelope.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::InvalidConfig(message)
            | Error::InvalidArgument(message)
            | Error::FetchFailed(message)
            | Error::ScheduleFailed(message) => Some(serde_json::json!({ "message": message })),
            Error::SnapshotNotFound(path) => {
                Some(serde_json::json!({ "path": path.to_string_lossy() }))
            }
            _ => None,
        }
    }
}

/// Result type alias for schedsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error body of the JSON envelope
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub message: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            message: err.to_string(),
            code: err.exit_code(),
            kind: err.kind(),
            details: err.details(),
        }
    }
}
