use std::collections::HashMap;

use chrono::{DateTime, Utc};
use event_pipeline_core::alert::build_critical_alert;
use event_pipeline_core::archive::{
    archive_body, archive_object_key, archive_object_metadata, build_archive_record,
    SqsMetadata, ARCHIVE_CONTENT_TYPE, ARCHIVE_PREFIX,
};
use event_pipeline_core::catalog::BusEntry;
use event_pipeline_core::config::DeadLetterConfig;
use event_pipeline_core::envelope::{BusEvent, EnvelopeError};
use event_pipeline_core::metrics::failed_event_metric;
use event_pipeline_core::policy::{
    decide, is_critical_event, receive_count, DeadLetterAction, ReceiveCount,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::adapters::{
    AdapterError, AlertNotifier, ArchiveObject, ArchiveStore, EventPublisher, MetricsSink,
};

/// Managed services the reprocessor talks to.
#[derive(Clone, Copy)]
pub struct DeadLetterServices<'a> {
    pub publisher: &'a dyn EventPublisher,
    pub archive: &'a dyn ArchiveStore,
    pub notifier: &'a dyn AlertNotifier,
    pub metrics: &'a dyn MetricsSink,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchItemFailure {
    #[serde(rename = "itemIdentifier")]
    pub item_identifier: String,
}

/// Partial batch response: listed messages stay on the queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SqsBatchResponse {
    #[serde(rename = "batchItemFailures")]
    pub batch_item_failures: Vec<BatchItemFailure>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqsRecord {
    pub message_id: Option<String>,
    pub receipt_handle: Option<String>,
    pub body: Option<String>,
    pub attributes: Value,
}

impl SqsRecord {
    /// Reads a record without failing: fields of the wrong type are absent,
    /// so a bad record only fails its own processing.
    pub fn from_value(record: &Value) -> Self {
        let text = |name: &str| record.get(name).and_then(Value::as_str).map(str::to_string);
        Self {
            message_id: text("messageId"),
            receipt_handle: text("receiptHandle"),
            body: text("body"),
            attributes: record.get("attributes").cloned().unwrap_or(Value::Null),
        }
    }

    fn attribute_map(&self) -> HashMap<String, String> {
        self.attributes
            .as_object()
            .map(|attributes| {
                attributes
                    .iter()
                    .filter_map(|(name, value)| {
                        value.as_str().map(|text| (name.clone(), text.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn metadata(&self) -> SqsMetadata {
        SqsMetadata {
            message_id: self.message_id.clone(),
            receipt_handle: self.receipt_handle.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Republished { event_id: Option<String> },
    Archived { key: String, alerted: bool },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordResult {
    pub message_id: Option<String>,
    pub outcome: RecordOutcome,
}

#[derive(Debug, Error)]
pub enum DeadLetterError {
    #[error("SQS event must include Records array")]
    MissingRecords,
}

#[derive(Debug, Error)]
enum RecordError {
    #[error("SQS record body must be a string")]
    MissingBody,
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error("failed to serialize archive record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to archive event: {0}")]
    Archive(#[source] AdapterError),
    #[error("failed to send alert: {0}")]
    Alert(#[source] AdapterError),
}

pub fn decode_sqs_records(event: &Value) -> Result<Vec<SqsRecord>, DeadLetterError> {
    let records = event
        .get("Records")
        .and_then(Value::as_array)
        .ok_or(DeadLetterError::MissingRecords)?;

    Ok(records.iter().map(SqsRecord::from_value).collect())
}

/// Processes one batch from the dead-letter queue.
///
/// Records are handled one after another. Only records that could neither be
/// republished nor archived (or whose alert could not be sent) are reported
/// back, so the queue redelivers them.
pub async fn handle_dead_letter_event(
    event: &Value,
    config: &DeadLetterConfig,
    services: DeadLetterServices<'_>,
    now: DateTime<Utc>,
) -> Result<SqsBatchResponse, DeadLetterError> {
    debug!(event = %event, "processing dead-letter batch");
    let records = decode_sqs_records(event)?;

    let mut results = Vec::with_capacity(records.len());
    for record in &records {
        results.push(process_record(record, config, services, now).await);
    }

    Ok(batch_response(&results))
}

pub async fn process_record(
    record: &SqsRecord,
    config: &DeadLetterConfig,
    services: DeadLetterServices<'_>,
    now: DateTime<Utc>,
) -> RecordResult {
    let outcome = match process_failed_event(record, config, services, now).await {
        Ok(outcome) => outcome,
        Err(record_error) => {
            error!(
                message_id = record.message_id.as_deref().unwrap_or_default(),
                error = %record_error,
                "error processing dead-letter record"
            );
            RecordOutcome::Failed {
                error: record_error.to_string(),
            }
        }
    };

    RecordResult {
        message_id: record.message_id.clone(),
        outcome,
    }
}

/// Failed records without a message id cannot be named in the response and
/// are deleted with the batch; they are logged instead.
pub fn batch_response(results: &[RecordResult]) -> SqsBatchResponse {
    let mut batch_item_failures = Vec::new();
    for result in results {
        let RecordOutcome::Failed { error } = &result.outcome else {
            continue;
        };
        match result.message_id.as_deref() {
            Some(message_id) if !message_id.is_empty() => {
                batch_item_failures.push(BatchItemFailure {
                    item_identifier: message_id.to_string(),
                });
            }
            _ => warn!(
                error = %error,
                "failed record has no message id and cannot be redelivered"
            ),
        }
    }

    SqsBatchResponse {
        batch_item_failures,
    }
}

async fn process_failed_event(
    record: &SqsRecord,
    config: &DeadLetterConfig,
    services: DeadLetterServices<'_>,
    now: DateTime<Utc>,
) -> Result<RecordOutcome, RecordError> {
    let body = record.body.as_deref().ok_or(RecordError::MissingBody)?;
    let original: Value = serde_json::from_str(body).map_err(EnvelopeError::from)?;
    let event = BusEvent::from_value(original.clone())?;
    let count = receive_count(&record.attribute_map());
    let failure_reason = event.failure_reason();

    info!(
        event_id = event.id_or_unknown(),
        receive_count = ?count.attempts(),
        failure_reason,
        "processing failed event"
    );

    if decide(count, config.max_retry_attempts, failure_reason) == DeadLetterAction::Republish {
        match republish_event(&event, config, services.publisher).await {
            Ok(()) => {
                info!(event_id = event.id_or_unknown(), "republished event");
                return Ok(RecordOutcome::Republished {
                    event_id: event.id.clone(),
                });
            }
            Err(republish_error) => {
                warn!(
                    event_id = event.id_or_unknown(),
                    error = %republish_error,
                    "failed to republish event, archiving instead"
                );
            }
        }
    }

    let key = archive_failed_event(&event, original, record, config, services.archive, now).await?;

    let alerted = if is_critical_event(event.detail_type.as_deref()) {
        send_alert(&event, count, &key, config, services.notifier).await?
    } else {
        false
    };

    if let Err(metrics_error) = services
        .metrics
        .put_metric_data(&config.metrics_namespace, &[failed_event_metric(&event, now)])
        .await
    {
        warn!(error = %metrics_error, "failed to publish failure metrics");
    }

    Ok(RecordOutcome::Archived { key, alerted })
}

async fn republish_event(
    event: &BusEvent,
    config: &DeadLetterConfig,
    publisher: &dyn EventPublisher,
) -> Result<(), AdapterError> {
    let entry = BusEntry::republish(event, &config.event_bus_name);
    publisher
        .put_events(std::slice::from_ref(&entry))
        .await?
        .into_result("eventbridge")
        .map(|_| ())
}

async fn archive_failed_event(
    event: &BusEvent,
    original: Value,
    record: &SqsRecord,
    config: &DeadLetterConfig,
    archive: &dyn ArchiveStore,
    now: DateTime<Utc>,
) -> Result<String, RecordError> {
    let key = archive_object_key(
        ARCHIVE_PREFIX,
        now,
        event.detail_type.as_deref(),
        event.id.as_deref(),
    );
    let archive_record = build_archive_record(original, record.metadata(), now);

    archive
        .put_object(ArchiveObject {
            bucket: config.failed_events_bucket.clone(),
            key: key.clone(),
            body: archive_body(&archive_record)?,
            content_type: ARCHIVE_CONTENT_TYPE.to_string(),
            metadata: archive_object_metadata(event),
        })
        .await
        .map_err(RecordError::Archive)?;

    info!(key = %key, "archived failed event");
    Ok(key)
}

async fn send_alert(
    event: &BusEvent,
    count: ReceiveCount,
    archive_key: &str,
    config: &DeadLetterConfig,
    notifier: &dyn AlertNotifier,
) -> Result<bool, RecordError> {
    let Some(topic_arn) = config.alert_topic_arn.as_deref() else {
        warn!("no alert topic configured, skipping alert");
        return Ok(false);
    };

    let alert = build_critical_alert(event, count, &config.failed_events_bucket, archive_key);
    notifier
        .publish(topic_arn, &alert)
        .await
        .map_err(RecordError::Alert)?;

    info!(event_id = event.id_or_unknown(), "alert sent for critical event");
    Ok(true)
}
