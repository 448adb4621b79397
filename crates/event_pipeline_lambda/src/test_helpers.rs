//! In-memory stand-ins for the managed services.
//!
//! Shared by unit tests and the event flow integration suite.

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use event_pipeline_core::alert::AlertMessage;
use event_pipeline_core::archive::processing_timestamp;
use event_pipeline_core::catalog::BusEntry;
use event_pipeline_core::metrics::MetricDatum;
use serde_json::{json, Value};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::adapters::{
    AdapterError, AlertNotifier, ArchiveObject, ArchiveStore, EventPublisher, MetricsSink,
    PutEventsEntryResult, PutEventsOutcome,
};
use crate::logging::{json_subscriber, DEFAULT_LOG_FILTER};

pub const TEST_REGION: &str = "us-east-1";
pub const TEST_ACCOUNT: &str = "123456789012";

/// Bus that accepts entries carrying a source and detail type, assigning
/// sequential event ids the way the managed bus assigns opaque ones.
#[derive(Default)]
pub struct InMemoryEventBus {
    accepted: Mutex<Vec<(String, BusEntry)>>,
    unavailable: bool,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus whose every call fails at the transport level.
    pub fn unavailable() -> Self {
        Self {
            accepted: Mutex::new(Vec::new()),
            unavailable: true,
        }
    }

    pub fn published(&self) -> Vec<BusEntry> {
        self.accepted
            .lock()
            .expect("poisoned mutex")
            .iter()
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    /// Accepted entries shaped as the events a rule target receives.
    pub fn delivered_events(&self) -> Vec<Value> {
        self.accepted
            .lock()
            .expect("poisoned mutex")
            .iter()
            .map(|(event_id, entry)| {
                json!({
                    "version": "0",
                    "id": event_id,
                    "source": entry.source,
                    "detail-type": entry.detail_type,
                    "account": TEST_ACCOUNT,
                    "time": processing_timestamp(Utc::now()),
                    "region": TEST_REGION,
                    "resources": [],
                    "detail": entry.detail,
                })
            })
            .collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn put_events(&self, entries: &[BusEntry]) -> Result<PutEventsOutcome, AdapterError> {
        if self.unavailable {
            return Err(AdapterError::request(
                "eventbridge",
                "PutEvents",
                "simulated bus outage",
            ));
        }

        let mut accepted = self.accepted.lock().expect("poisoned mutex");
        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.source.is_none() || entry.detail_type.is_none() {
                results.push(PutEventsEntryResult {
                    event_id: None,
                    error_code: Some("MalformedDetail".to_string()),
                    error_message: Some("Source and DetailType are required".to_string()),
                });
                continue;
            }
            let event_id = format!("evt-{:04}", accepted.len() + 1);
            accepted.push((event_id.clone(), entry.clone()));
            results.push(PutEventsEntryResult {
                event_id: Some(event_id),
                ..Default::default()
            });
        }

        let failed_entry_count = results
            .iter()
            .filter(|result| result.error_code.is_some())
            .count();
        Ok(PutEventsOutcome {
            failed_entry_count,
            entries: results,
        })
    }
}

#[derive(Default)]
pub struct RecordingArchiveStore {
    objects: Mutex<Vec<ArchiveObject>>,
    failing: bool,
}

impl RecordingArchiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            objects: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn objects(&self) -> Vec<ArchiveObject> {
        self.objects.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl ArchiveStore for RecordingArchiveStore {
    async fn put_object(&self, object: ArchiveObject) -> Result<(), AdapterError> {
        if self.failing {
            return Err(AdapterError::request(
                "s3",
                "PutObject",
                format!("simulated write failure for key: {}", object.key),
            ));
        }
        self.objects.lock().expect("poisoned mutex").push(object);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<(String, AlertMessage)>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            alerts: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn alerts(&self) -> Vec<(String, AlertMessage)> {
        self.alerts.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl AlertNotifier for RecordingNotifier {
    async fn publish(&self, topic_arn: &str, alert: &AlertMessage) -> Result<(), AdapterError> {
        if self.failing {
            return Err(AdapterError::request("sns", "Publish", "simulated outage"));
        }
        self.alerts
            .lock()
            .expect("poisoned mutex")
            .push((topic_arn.to_string(), alert.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingMetricsSink {
    calls: Mutex<Vec<(String, Vec<MetricDatum>)>>,
    failing: bool,
}

impl RecordingMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<MetricDatum>)> {
        self.calls.lock().expect("poisoned mutex").clone()
    }

    pub fn metric_names(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .flat_map(|(_, data)| data.into_iter().map(|datum| datum.name))
            .collect()
    }
}

#[async_trait]
impl MetricsSink for RecordingMetricsSink {
    async fn put_metric_data(
        &self,
        namespace: &str,
        data: &[MetricDatum],
    ) -> Result<(), AdapterError> {
        if self.failing {
            return Err(AdapterError::request(
                "cloudwatch",
                "PutMetricData",
                "simulated throttling",
            ));
        }
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push((namespace.to_string(), data.to_vec()));
        Ok(())
    }
}

/// JSON log lines written by the production formatter, kept in memory.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn lines(&self) -> Vec<Value> {
        let buffer = self.buffer.lock().expect("poisoned mutex");
        String::from_utf8_lossy(&buffer)
            .lines()
            .map(|line| serde_json::from_str(line).expect("log line should be json"))
            .collect()
    }

    pub fn with_field(&self, name: &str, value: &str) -> Vec<Value> {
        self.lines()
            .into_iter()
            .filter(|line| line[name] == value)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .expect("poisoned mutex")
            .extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'writer> MakeWriter<'writer> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'writer self) -> Self::Writer {
        self.clone()
    }
}

/// Routes this thread's logs into memory until the guard is dropped.
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let subscriber = json_subscriber(EnvFilter::new(DEFAULT_LOG_FILTER), logs.clone());
    (logs, tracing::subscriber::set_default(subscriber))
}
