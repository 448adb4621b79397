//! Shared event pipeline domain primitives.
//!
//! This crate owns the decisions made by the dead-letter reprocessor and the
//! event logger: envelope parsing, retry/archive policy, archive layout, alert
//! text, metric specifications and configuration. It intentionally excludes
//! AWS SDK and Lambda runtime concerns.

pub mod alert;
pub mod archive;
pub mod catalog;
pub mod config;
pub mod envelope;
pub mod log_record;
pub mod metrics;
pub mod policy;

pub const UNKNOWN: &str = "unknown";
