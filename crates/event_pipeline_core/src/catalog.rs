//! Events exchanged over the application bus.
//!
//! Upload and transcription services publish the typed details below; the
//! reprocessor republishes dead-lettered events as plain [`BusEntry`] values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::BusEvent;

pub const UPLOAD_SERVICE_SOURCE: &str = "custom.upload-service";
pub const TRANSCRIPTION_SERVICE_SOURCE: &str = "custom.transcription-service";

/// One entry of a PutEvents request.
#[derive(Debug, Clone, PartialEq)]
pub struct BusEntry {
    pub source: Option<String>,
    pub detail_type: Option<String>,
    pub detail: Value,
    pub event_bus_name: Option<String>,
}

impl BusEntry {
    pub fn new(source: &str, detail_type: &str, detail: Value) -> Self {
        Self {
            source: Some(source.to_string()),
            detail_type: Some(detail_type.to_string()),
            detail,
            event_bus_name: None,
        }
    }

    pub fn from_detail<D: CatalogEvent>(detail: &D) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            D::SOURCE,
            D::DETAIL_TYPE,
            serde_json::to_value(detail)?,
        ))
    }

    /// Copy of a dead-lettered event without its dead-letter fields.
    pub fn republish(event: &BusEvent, event_bus_name: &str) -> Self {
        Self {
            source: event.source.clone(),
            detail_type: event.detail_type.clone(),
            detail: event.detail.clone(),
            event_bus_name: Some(event_bus_name.to_string()),
        }
    }

    pub fn on_bus(mut self, event_bus_name: impl Into<String>) -> Self {
        self.event_bus_name = Some(event_bus_name.into());
        self
    }

    /// The detail as the JSON string the bus expects.
    pub fn detail_json(&self) -> String {
        self.detail.to_string()
    }
}

pub trait CatalogEvent: Serialize {
    const SOURCE: &'static str;
    const DETAIL_TYPE: &'static str;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Location {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub format: String,
    pub size: u64,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AudioUploaded {
    pub user_id: String,
    pub file_id: String,
    pub s3_location: S3Location,
    pub metadata: FileMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUploaded {
    pub user_id: String,
    pub file_id: String,
    pub s3_location: S3Location,
    pub metadata: FileMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptLocation {
    pub bucket: String,
    pub text_key: String,
    pub json_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptMetadata {
    pub language: String,
    pub duration: u64,
    pub word_count: u64,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionCompleted {
    pub user_id: String,
    pub file_id: String,
    pub job_id: String,
    pub status: String,
    pub source_audio: S3Location,
    pub transcript_location: TranscriptLocation,
    pub transcript_metadata: TranscriptMetadata,
    pub completed_at: String,
}

impl CatalogEvent for AudioUploaded {
    const SOURCE: &'static str = UPLOAD_SERVICE_SOURCE;
    const DETAIL_TYPE: &'static str = "Audio Uploaded";
}

impl CatalogEvent for DocumentUploaded {
    const SOURCE: &'static str = UPLOAD_SERVICE_SOURCE;
    const DETAIL_TYPE: &'static str = "Document Uploaded";
}

impl CatalogEvent for TranscriptionCompleted {
    const SOURCE: &'static str = TRANSCRIPTION_SERVICE_SOURCE;
    const DETAIL_TYPE: &'static str = "Transcription Completed";
}
