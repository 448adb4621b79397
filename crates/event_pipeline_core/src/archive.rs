use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::BusEvent;
use crate::UNKNOWN;

pub const ARCHIVE_PREFIX: &str = "failed-events";
pub const ARCHIVE_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SqsMetadata {
    pub message_id: Option<String>,
    pub receipt_handle: Option<String>,
    pub attributes: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRecord {
    pub original_event: Value,
    pub sqs_metadata: SqsMetadata,
    pub processed_at: String,
}

/// Processing time as written into keys and records: RFC 3339, UTC, millis.
pub fn processing_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn archive_object_key(
    base_prefix: &str,
    processed_at: DateTime<Utc>,
    detail_type: Option<&str>,
    event_id: Option<&str>,
) -> String {
    let trimmed = base_prefix.trim_matches('/');
    let date = processed_at.format("%Y-%m-%d");
    let timestamp = processing_timestamp(processed_at);
    format!(
        "{trimmed}/{date}/{}/{}-{timestamp}.json",
        detail_type.unwrap_or(UNKNOWN),
        event_id.unwrap_or(UNKNOWN),
    )
}

pub fn build_archive_record(
    original_event: Value,
    sqs_metadata: SqsMetadata,
    processed_at: DateTime<Utc>,
) -> ArchiveRecord {
    ArchiveRecord {
        original_event,
        sqs_metadata,
        processed_at: processing_timestamp(processed_at),
    }
}

pub fn archive_body(record: &ArchiveRecord) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec_pretty(record)
}

/// User-defined object metadata attached to the archived object.
pub fn archive_object_metadata(event: &BusEvent) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("event-id".to_string(), event.id_or_unknown().to_string()),
        (
            "event-type".to_string(),
            event.detail_type_or_unknown().to_string(),
        ),
        (
            "user-id".to_string(),
            event
                .user_id()
                .map(|user_id| user_id.into_owned())
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ),
    ])
}
