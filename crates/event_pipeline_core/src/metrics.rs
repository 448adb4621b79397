use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::envelope::BusEvent;

pub const EVENTS_NAMESPACE: &str = "EventBridge/Events";
pub const DEAD_LETTER_NAMESPACE: &str = "EventBridge/DeadLetter";

pub const EVENTS_RECEIVED: &str = "EventsReceived";
pub const TRANSCRIPTION_STATUS: &str = "TranscriptionStatus";
pub const TRANSCRIPTION_PROCESSING_TIME: &str = "TranscriptionProcessingTime";
pub const FAILED_EVENTS: &str = "FailedEvents";

pub const TRANSCRIPTION_COMPLETED: &str = "Transcription Completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricUnit {
    Count,
    Seconds,
}

impl MetricUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Count => "Count",
            Self::Seconds => "Seconds",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDimension {
    pub name: String,
    pub value: String,
}

impl MetricDimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricDatum {
    pub name: String,
    pub value: f64,
    pub unit: MetricUnit,
    pub dimensions: Vec<MetricDimension>,
    pub timestamp: DateTime<Utc>,
}

impl MetricDatum {
    pub fn count(name: &str, dimensions: Vec<MetricDimension>, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            value: 1.0,
            unit: MetricUnit::Count,
            dimensions,
            timestamp,
        }
    }
}

/// Metrics published by the event logger for one observed event.
pub fn event_received_metrics(event: &BusEvent, now: DateTime<Utc>) -> Vec<MetricDatum> {
    let event_type = event.detail_type_or_unknown();
    let mut data = vec![MetricDatum::count(
        EVENTS_RECEIVED,
        vec![
            MetricDimension::new("EventSource", event.source_or_unknown()),
            MetricDimension::new("EventType", event_type),
        ],
        now,
    )];

    if event_type != TRANSCRIPTION_COMPLETED {
        return data;
    }
    let Some(status) = event.detail_text("status") else {
        return data;
    };

    data.push(MetricDatum::count(
        TRANSCRIPTION_STATUS,
        vec![MetricDimension::new("Status", status)],
        now,
    ));

    if let Some(seconds) = transcription_processing_time(event) {
        data.push(MetricDatum {
            name: TRANSCRIPTION_PROCESSING_TIME.to_string(),
            value: seconds,
            unit: MetricUnit::Seconds,
            dimensions: Vec::new(),
            timestamp: now,
        });
    }

    data
}

fn transcription_processing_time(event: &BusEvent) -> Option<f64> {
    event
        .detail
        .get("transcriptMetadata")
        .and_then(|metadata| metadata.get("processingTime"))
        .and_then(Value::as_f64)
        .filter(|seconds| seconds.is_finite() && *seconds != 0.0)
}

/// Metric published by the reprocessor for every archived event.
pub fn failed_event_metric(event: &BusEvent, now: DateTime<Utc>) -> MetricDatum {
    MetricDatum::count(
        FAILED_EVENTS,
        vec![
            MetricDimension::new("EventType", event.detail_type_or_unknown()),
            MetricDimension::new("EventSource", event.source_or_unknown()),
        ],
        now,
    )
}
