//! Event flow tests across the bus, the event logger and the reprocessor.
//!
//! The in-process tests run everywhere. The `live_` tests publish to a real
//! bus and need AWS credentials plus `TEST_EVENT_BUS_NAME`; run them with
//! `cargo run -p xtask -- integration-test`.

use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use chrono::Utc;
use event_pipeline_core::catalog::{
    AudioUploaded, BusEntry, DocumentUploaded, FileMetadata, S3Location, TranscriptLocation,
    TranscriptMetadata, TranscriptionCompleted,
};
use event_pipeline_core::config::{DeadLetterConfig, EventLoggerConfig};
use event_pipeline_lambda::adapters::aws::EventBridgePublisher;
use event_pipeline_lambda::adapters::{EventPublisher, PutEventsOutcome};
use event_pipeline_lambda::handlers::dead_letter::{handle_dead_letter_event, DeadLetterServices};
use event_pipeline_lambda::handlers::event_logger::handle_observed_event;
use event_pipeline_lambda::test_helpers::{
    InMemoryEventBus, RecordingArchiveStore, RecordingMetricsSink, RecordingNotifier,
};
use serde_json::{json, Value};
use uuid::Uuid;

const DEFAULT_TEST_EVENT_BUS: &str = "test-application-events";

fn audio_uploaded(user_id: &str, key: &str) -> BusEntry {
    BusEntry::from_detail(&AudioUploaded {
        user_id: user_id.to_string(),
        file_id: Uuid::new_v4().to_string(),
        s3_location: S3Location {
            bucket: "test-audio-bucket".to_string(),
            key: key.to_string(),
        },
        metadata: FileMetadata {
            format: "mp3".to_string(),
            size: 1_024_000,
            content_type: "audio/mpeg".to_string(),
        },
    })
    .expect("audio detail should serialize")
}

fn document_uploaded(user_id: &str, key: &str) -> BusEntry {
    BusEntry::from_detail(&DocumentUploaded {
        user_id: user_id.to_string(),
        file_id: Uuid::new_v4().to_string(),
        s3_location: S3Location {
            bucket: "test-document-bucket".to_string(),
            key: key.to_string(),
        },
        metadata: FileMetadata {
            format: "pdf".to_string(),
            size: 2_048_000,
            content_type: "application/pdf".to_string(),
        },
    })
    .expect("document detail should serialize")
}

fn transcription_completed(user_id: &str) -> BusEntry {
    BusEntry::from_detail(&TranscriptionCompleted {
        user_id: user_id.to_string(),
        file_id: Uuid::new_v4().to_string(),
        job_id: Uuid::new_v4().to_string(),
        status: "completed".to_string(),
        source_audio: S3Location {
            bucket: "test-audio-bucket".to_string(),
            key: format!("{user_id}/audio-file.mp3"),
        },
        transcript_location: TranscriptLocation {
            bucket: "test-transcript-bucket".to_string(),
            text_key: format!("{user_id}/transcript.txt"),
            json_key: format!("{user_id}/transcript.json"),
        },
        transcript_metadata: TranscriptMetadata {
            language: "en".to_string(),
            duration: 180,
            word_count: 450,
            model: "whisper-large-v3".to_string(),
            processing_time: Some(42.0),
        },
        completed_at: Utc::now().to_rfc3339(),
    })
    .expect("transcription detail should serialize")
}

fn invalid_event() -> BusEntry {
    BusEntry::new(
        "custom.upload-service",
        "Invalid Event",
        json!({"invalidField": "test"}),
    )
}

fn assert_all_accepted(outcome: &PutEventsOutcome, expected: usize) {
    assert_eq!(outcome.failed_entry_count, 0, "entries: {:?}", outcome.entries);
    assert_eq!(outcome.entries.len(), expected);
    assert!(outcome
        .entries
        .iter()
        .all(|entry| entry.event_id.as_deref().is_some_and(|id| !id.is_empty())));
}

#[tokio::test]
async fn published_events_reach_the_event_logger() {
    let bus = InMemoryEventBus::new();
    let entries = vec![
        audio_uploaded("flow-user-1", "flow-user-1/file1.mp3"),
        document_uploaded("flow-user-2", "flow-user-2/file2.pdf"),
        transcription_completed("flow-user-3"),
    ];
    let outcome = bus.put_events(&entries).await.expect("bus should accept");
    assert_all_accepted(&outcome, 3);

    let sink = RecordingMetricsSink::new();
    let config = EventLoggerConfig::default();
    for event in bus.delivered_events() {
        let response = handle_observed_event(event, &config, &sink, Utc::now()).await;
        let body: Value = serde_json::from_str(&response.body).expect("body should be json");
        assert_eq!(response.status_code, 200);
        assert_eq!(body["message"], "Event logged successfully");
    }

    assert_eq!(
        sink.metric_names(),
        vec![
            "EventsReceived".to_string(),
            "EventsReceived".to_string(),
            "EventsReceived".to_string(),
            "TranscriptionStatus".to_string(),
            "TranscriptionProcessingTime".to_string(),
        ]
    );
}

#[tokio::test]
async fn schema_less_events_are_logged_with_fallbacks() {
    let bus = InMemoryEventBus::new();
    bus.put_events(&[invalid_event()])
        .await
        .expect("bus should accept");

    let sink = RecordingMetricsSink::new();
    let event = bus.delivered_events().remove(0);
    let response =
        handle_observed_event(event, &EventLoggerConfig::default(), &sink, Utc::now()).await;

    assert_eq!(response.status_code, 200);
    let calls = sink.calls();
    let dimensions = &calls[0].1[0].dimensions;
    assert_eq!(dimensions[1].value, "Invalid Event");
}

#[tokio::test]
async fn dead_lettered_events_are_republished_or_archived() {
    let bus = InMemoryEventBus::new();
    let archive = RecordingArchiveStore::new();
    let notifier = RecordingNotifier::new();
    let metrics = RecordingMetricsSink::new();
    let services = DeadLetterServices {
        publisher: &bus,
        archive: &archive,
        notifier: &notifier,
        metrics: &metrics,
    };
    let config = DeadLetterConfig {
        alert_topic_arn: Some("arn:aws:sns:us-east-1:123456789012:alerts".to_string()),
        event_bus_name: DEFAULT_TEST_EVENT_BUS.to_string(),
        ..DeadLetterConfig::default()
    };

    let audio = audio_uploaded("dlq-user-1", "dlq-user-1/file.mp3");
    let transcription = transcription_completed("dlq-user-2");
    let dead_lettered = |id: &str, entry: &BusEntry, reason: &str| {
        json!({
            "id": id,
            "source": entry.source,
            "detail-type": entry.detail_type,
            "failureReason": reason,
            "detail": entry.detail,
        })
    };
    let batch = json!({
        "Records": [
            {
                "messageId": "msg-retry",
                "receiptHandle": "handle-retry",
                "body": dead_lettered("evt-audio", &audio, "Lambda throttled").to_string(),
                "attributes": {"ApproximateReceiveCount": "1"}
            },
            {
                "messageId": "msg-archive",
                "receiptHandle": "handle-archive",
                "body": dead_lettered("evt-transcript", &transcription, "Invalid target").to_string(),
                "attributes": {"ApproximateReceiveCount": "1"}
            }
        ]
    });

    let response = handle_dead_letter_event(&batch, &config, services, Utc::now())
        .await
        .expect("batch should process");
    assert!(response.batch_item_failures.is_empty());

    let republished = bus.published();
    assert_eq!(republished.len(), 1);
    assert_eq!(republished[0].detail, audio.detail);
    assert_eq!(
        republished[0].event_bus_name.as_deref(),
        Some(DEFAULT_TEST_EVENT_BUS)
    );

    let archived = archive.objects();
    assert_eq!(archived.len(), 1);
    assert!(archived[0]
        .key
        .contains("/Transcription Completed/evt-transcript-"));
    assert_eq!(notifier.alerts().len(), 1);
    assert_eq!(metrics.metric_names(), vec!["FailedEvents".to_string()]);

    // The republished copy flows back through the logger like any new event.
    let sink = RecordingMetricsSink::new();
    let redelivered = bus.delivered_events().remove(0);
    let logged =
        handle_observed_event(redelivered, &EventLoggerConfig::default(), &sink, Utc::now()).await;
    assert_eq!(logged.status_code, 200);
    assert_eq!(sink.metric_names(), vec!["EventsReceived".to_string()]);
}

async fn live_publisher() -> (EventBridgePublisher, String) {
    let region = RegionProviderChain::default_provider().or_else("us-east-1");
    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(region)
        .load()
        .await;
    let bus_name = std::env::var("TEST_EVENT_BUS_NAME")
        .unwrap_or_else(|_| DEFAULT_TEST_EVENT_BUS.to_string());
    (
        EventBridgePublisher::new(aws_sdk_eventbridge::Client::new(&config)),
        bus_name,
    )
}

async fn publish_live(entries: Vec<BusEntry>) -> PutEventsOutcome {
    let (publisher, bus_name) = live_publisher().await;
    let entries = entries
        .into_iter()
        .map(|entry| entry.on_bus(bus_name.clone()))
        .collect::<Vec<_>>();
    publisher
        .put_events(&entries)
        .await
        .expect("live bus should accept the request")
}

#[tokio::test]
#[ignore = "requires AWS credentials and TEST_EVENT_BUS_NAME"]
async fn live_publishes_audio_uploaded_event() {
    let outcome = publish_live(vec![audio_uploaded(
        "test-user-123",
        "test-user-123/test-file.mp3",
    )])
    .await;
    assert_all_accepted(&outcome, 1);
}

#[tokio::test]
#[ignore = "requires AWS credentials and TEST_EVENT_BUS_NAME"]
async fn live_publishes_document_uploaded_event() {
    let outcome = publish_live(vec![document_uploaded(
        "test-user-456",
        "test-user-456/test-document.pdf",
    )])
    .await;
    assert_all_accepted(&outcome, 1);
}

#[tokio::test]
#[ignore = "requires AWS credentials and TEST_EVENT_BUS_NAME"]
async fn live_publishes_transcription_completed_event() {
    let outcome = publish_live(vec![transcription_completed("test-user-789")]).await;
    assert_all_accepted(&outcome, 1);
}

#[tokio::test]
#[ignore = "requires AWS credentials and TEST_EVENT_BUS_NAME"]
async fn live_publishes_batch_of_events() {
    let outcome = publish_live(vec![
        audio_uploaded("batch-test-1", "batch-test-1/file1.mp3"),
        document_uploaded("batch-test-2", "batch-test-2/file2.pdf"),
    ])
    .await;
    assert_all_accepted(&outcome, 2);
}

#[tokio::test]
#[ignore = "requires AWS credentials and TEST_EVENT_BUS_NAME"]
async fn live_accepts_schema_less_event() {
    // The bus does not validate details; consumers tolerate missing fields.
    let outcome = publish_live(vec![invalid_event()]).await;
    assert_all_accepted(&outcome, 1);
}
