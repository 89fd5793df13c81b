//! schedsync - Project Schedule Reconciliation Library
//!
//! This library provides the core functionality for the schedsync CLI tool,
//! which keeps a project tracker's computed schedule fields in step with an
//! external task scheduler.
//!
//! # Core Concepts
//!
//! - **Work Items**: tracker issues and drafts, keyed across repositories
//! - **Tasks**: the scheduler-facing form of a work item
//! - **Diagnostics**: why an item cannot be scheduled, or is at risk
//! - **Date Updates**: the minimal set of field writes per run
//! - **Privacy**: redaction of other private repositories in shared output
//!
//! # Module Organization
//!
//! - `item`: Work item model and key derivation
//! - `store`: Work item store, snapshot loading, reverse dependencies
//! - `task`: Task normalization and resource calendars
//! - `package`: Milestone ordering
//! - `issue`: Scheduling diagnostics
//! - `schedule`: Scheduler collaborator interface
//! - `cycle`: Cycle diagnostics from scheduler output
//! - `reconcile`: Three-pass date diff
//! - `risk`: At-risk detection
//! - `privacy`: Redaction policy
//! - `apply`: Field-write application and the JSONL write log
//! - `comment`: Scheduling comment planning
//! - `engine`: End-to-end run pipeline
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.schedsync.toml`
//! - `error`: Error types and result aliases

pub mod apply;
pub mod cli;
pub mod comment;
pub mod config;
pub mod cycle;
pub mod engine;
pub mod error;
pub mod issue;
pub mod item;
pub mod output;
pub mod package;
pub mod privacy;
pub mod reconcile;
pub mod risk;
pub mod schedule;
pub mod store;
pub mod task;

pub use error::{Error, Result};
