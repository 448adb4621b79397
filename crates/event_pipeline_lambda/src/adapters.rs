//! Seams between the handlers and the managed services they call.

use std::fmt::Display;

use thiserror::Error;

pub mod aws;
pub mod event_bus;
pub mod metrics_sink;
pub mod notifier;
pub mod object_store;

pub use event_bus::{EventPublisher, PutEventsEntryResult, PutEventsOutcome};
pub use metrics_sink::MetricsSink;
pub use notifier::AlertNotifier;
pub use object_store::{ArchiveObject, ArchiveStore};

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{service} {operation} failed: {message}")]
    Request {
        service: &'static str,
        operation: &'static str,
        message: String,
    },
    #[error("{service} rejected {rejected} of the submitted entries: {details}")]
    Rejected {
        service: &'static str,
        rejected: usize,
        details: String,
    },
    #[error("invalid {shape} for {service}: {message}")]
    InvalidShape {
        service: &'static str,
        shape: &'static str,
        message: String,
    },
}

impl AdapterError {
    pub fn request(service: &'static str, operation: &'static str, error: impl Display) -> Self {
        Self::Request {
            service,
            operation,
            message: error.to_string(),
        }
    }

    pub fn invalid_shape(service: &'static str, shape: &'static str, error: impl Display) -> Self {
        Self::InvalidShape {
            service,
            shape,
            message: error.to_string(),
        }
    }
}
