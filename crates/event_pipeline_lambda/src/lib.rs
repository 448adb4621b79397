//! AWS-oriented adapters and handlers for the event pipeline Lambdas.
//!
//! This crate owns runtime integration details (Lambda handlers, managed
//! service clients and log setup). Decisions about what to retry, archive,
//! alert on or measure live in `event_pipeline_core`.

pub mod adapters;
pub mod handlers;
pub mod logging;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
