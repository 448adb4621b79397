use chrono::{DateTime, Utc};
use event_pipeline_core::config::EventLoggerConfig;
use event_pipeline_core::envelope::{BusEvent, EnvelopeError};
use event_pipeline_core::log_record::{EventErrorRecord, EventReceivedRecord};
use event_pipeline_core::metrics::event_received_metrics;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::adapters::{AdapterError, MetricsSink};

pub const LOGGED_MESSAGE: &str = "Event logged successfully";
pub const LOGGED_WITH_ERRORS_MESSAGE: &str = "Event logged with errors";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

#[derive(Debug, Error)]
enum LoggerError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error(transparent)]
    Metrics(#[from] AdapterError),
}

/// Logs and measures one event observed on the bus.
///
/// Always answers 200: a failing logger must not make the bus retry events.
pub async fn handle_observed_event(
    event: Value,
    config: &EventLoggerConfig,
    metrics: &dyn MetricsSink,
    now: DateTime<Utc>,
) -> LoggerResponse {
    debug!(event = %event, "received event");
    let event_id = event.get("id").filter(|id| !id.is_null()).cloned();

    match log_event(event, config, metrics, now).await {
        Ok(()) => response(LOGGED_MESSAGE, event_id, None),
        Err(logger_error) => {
            error!(error = %logger_error, "error processing event");
            response(LOGGED_WITH_ERRORS_MESSAGE, event_id, Some(logger_error.to_string()))
        }
    }
}

async fn log_event(
    event: Value,
    config: &EventLoggerConfig,
    metrics: &dyn MetricsSink,
    now: DateTime<Utc>,
) -> Result<(), LoggerError> {
    let event = BusEvent::from_value(event)?;

    let received = EventReceivedRecord::from_event(&event, now);
    let resources = received
        .metadata
        .resources
        .as_ref()
        .map(Value::to_string);
    info!(
        logType = received.log_type,
        eventId = received.event_id.as_deref(),
        eventSource = %received.event_source,
        eventType = %received.event_type,
        eventTime = %received.event_time,
        userId = %received.user_id,
        fileId = %received.file_id,
        status = %received.status,
        metadata.region = received.metadata.region.as_deref(),
        metadata.account = received.metadata.account.as_deref(),
        metadata.resources = resources.as_deref(),
        "event received"
    );

    metrics
        .put_metric_data(&config.metrics_namespace, &event_received_metrics(&event, now))
        .await?;

    if let Some(error_record) = EventErrorRecord::from_event(&event) {
        let detail_error = match &error_record.error {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        error!(
            logType = error_record.log_type,
            eventId = error_record.event_id.as_deref(),
            eventType = %error_record.event_type,
            error = %detail_error,
            "event contains error"
        );
    }

    Ok(())
}

/// The `eventId` key is left out when the event carried no `id`.
fn response(message: &str, event_id: Option<Value>, error: Option<String>) -> LoggerResponse {
    let mut body = Map::new();
    body.insert("message".to_string(), Value::from(message));
    if let Some(event_id) = event_id {
        body.insert("eventId".to_string(), event_id);
    }
    if let Some(error) = error {
        body.insert("error".to_string(), Value::from(error));
    }

    LoggerResponse {
        status_code: 200,
        body: Value::Object(body).to_string(),
    }
}
