use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::archive::processing_timestamp;
use crate::envelope::BusEvent;

pub const EVENT_RECEIVED: &str = "EVENT_RECEIVED";
pub const EVENT_ERROR: &str = "EVENT_ERROR";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EventMetadata {
    pub region: Option<String>,
    pub account: Option<String>,
    pub resources: Option<Value>,
}

/// Record emitted for every observed event, queried through Logs Insights.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventReceivedRecord {
    pub log_type: &'static str,
    pub event_id: Option<String>,
    pub event_source: String,
    pub event_type: String,
    pub event_time: String,
    pub user_id: String,
    pub file_id: String,
    pub status: String,
    pub metadata: EventMetadata,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventErrorRecord {
    pub log_type: &'static str,
    pub event_id: Option<String>,
    pub event_type: String,
    pub error: Value,
}

impl EventReceivedRecord {
    pub fn from_event(event: &BusEvent, now: DateTime<Utc>) -> Self {
        Self {
            log_type: EVENT_RECEIVED,
            event_id: event.id.clone(),
            event_source: event.source_or_unknown().to_string(),
            event_type: event.detail_type_or_unknown().to_string(),
            event_time: event
                .time
                .clone()
                .filter(|time| !time.is_empty())
                .unwrap_or_else(|| processing_timestamp(now)),
            user_id: event.detail_text_or_unknown("userId").into_owned(),
            file_id: event.detail_text_or_unknown("fileId").into_owned(),
            status: event.detail_text_or_unknown("status").into_owned(),
            metadata: EventMetadata {
                region: event.region.clone(),
                account: event.account.clone(),
                resources: event.resources.clone(),
            },
        }
    }
}

impl EventErrorRecord {
    pub fn from_event(event: &BusEvent) -> Option<Self> {
        let error = event.detail_error()?;
        Some(Self {
            log_type: EVENT_ERROR,
            event_id: event.id.clone(),
            event_type: event.detail_type_or_unknown().to_string(),
            error: error.clone(),
        })
    }
}
