use std::borrow::Cow;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::UNKNOWN;

pub const UNKNOWN_FAILURE_REASON: &str = "Unknown";

/// An event as routed by the bus, or its dead-lettered copy.
///
/// Producers are not schema-validated, so nothing here is required: fields
/// of an unexpected type are read as text where that makes sense and are
/// otherwise treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusEvent {
    pub id: Option<String>,
    pub source: Option<String>,
    pub detail_type: Option<String>,
    pub time: Option<String>,
    pub region: Option<String>,
    pub account: Option<String>,
    /// Passed through untouched.
    pub resources: Option<Value>,
    pub detail: Value,
    pub failure_reason: Option<String>,
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("event payload must be a JSON object")]
    NotAnObject,
    #[error("malformed event payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Text rendering of a loosely typed field.
///
/// Empty strings, zero, `false` and `null` count as missing; numbers and
/// `true` are rendered, objects and arrays become compact JSON.
pub fn field_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(text) if !text.is_empty() => Some(Cow::Borrowed(text.as_str())),
        Value::Number(number) if number.as_f64() != Some(0.0) => {
            Some(Cow::Owned(number.to_string()))
        }
        Value::Bool(true) => Some(Cow::Borrowed("true")),
        Value::Object(_) | Value::Array(_) => Some(Cow::Owned(value.to_string())),
        _ => None,
    }
}

fn owned_text(object: &Map<String, Value>, name: &str) -> Option<String> {
    object.get(name).and_then(field_text).map(Cow::into_owned)
}

impl BusEvent {
    pub fn from_value(value: Value) -> Result<Self, EnvelopeError> {
        let Value::Object(mut object) = value else {
            return Err(EnvelopeError::NotAnObject);
        };

        let detail = match object.remove("detail") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(detail) => detail,
        };
        let resources = object.remove("resources").filter(|value| !value.is_null());

        Ok(Self {
            id: owned_text(&object, "id"),
            source: owned_text(&object, "source"),
            detail_type: owned_text(&object, "detail-type"),
            time: owned_text(&object, "time"),
            region: owned_text(&object, "region"),
            account: owned_text(&object, "account"),
            resources,
            detail,
            failure_reason: owned_text(&object, "failureReason"),
        })
    }

    pub fn from_json_str(body: &str) -> Result<Self, EnvelopeError> {
        let value: Value = serde_json::from_str(body)?;
        Self::from_value(value)
    }

    pub fn source_or_unknown(&self) -> &str {
        self.source.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn detail_type_or_unknown(&self) -> &str {
        self.detail_type.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn id_or_unknown(&self) -> &str {
        self.id.as_deref().unwrap_or(UNKNOWN)
    }

    /// A `detail` field rendered as text, see [`field_text`].
    pub fn detail_text(&self, name: &str) -> Option<Cow<'_, str>> {
        self.detail.get(name).and_then(field_text)
    }

    pub fn detail_text_or_unknown(&self, name: &str) -> Cow<'_, str> {
        self.detail_text(name).unwrap_or(Cow::Borrowed(UNKNOWN))
    }

    pub fn user_id(&self) -> Option<Cow<'_, str>> {
        self.detail_text("userId")
    }

    pub fn failure_reason(&self) -> &str {
        self.failure_reason.as_deref().unwrap_or(UNKNOWN_FAILURE_REASON)
    }

    /// The `detail.error` value, when it carries anything.
    pub fn detail_error(&self) -> Option<&Value> {
        self.detail
            .get("error")
            .filter(|value| field_text(value).is_some())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_bus_event_fields() {
        let event = BusEvent::from_value(json!({
            "id": "evt-1",
            "source": "custom.upload-service",
            "detail-type": "Audio Uploaded",
            "time": "2026-02-14T10:00:00Z",
            "region": "us-east-1",
            "account": "123456789012",
            "resources": ["arn:aws:s3:::bucket"],
            "detail": {"userId": "user-1", "fileId": "file-1"}
        }))
        .expect("event should parse");

        assert_eq!(event.id_or_unknown(), "evt-1");
        assert_eq!(event.detail_type_or_unknown(), "Audio Uploaded");
        assert_eq!(event.user_id().as_deref(), Some("user-1"));
        assert_eq!(event.detail_text_or_unknown("status"), "unknown");
        assert_eq!(event.failure_reason(), "Unknown");
    }

    #[test]
    fn missing_detail_becomes_empty_object() {
        let event = BusEvent::from_value(json!({"id": "evt-2", "detail": null}))
            .expect("event should parse");

        assert_eq!(event.detail, json!({}));
        assert_eq!(event.source_or_unknown(), "unknown");
        assert_eq!(event.detail_type_or_unknown(), "unknown");
    }

    #[test]
    fn wrongly_typed_fields_fall_back_instead_of_failing() {
        let event = BusEvent::from_value(json!({
            "id": 12345,
            "source": {"nested": true},
            "detail-type": null,
            "account": false,
            "resources": [{"arn": "a"}],
            "failureReason": ""
        }))
        .expect("loosely typed event should parse");

        assert_eq!(event.id.as_deref(), Some("12345"));
        assert_eq!(event.source_or_unknown(), r#"{"nested":true}"#);
        assert_eq!(event.detail_type_or_unknown(), "unknown");
        assert_eq!(event.account, None);
        assert_eq!(event.resources, Some(json!([{"arn": "a"}])));
        assert_eq!(event.failure_reason(), "Unknown");
    }

    #[test]
    fn detail_text_renders_truthy_non_strings() {
        let event = BusEvent::from_value(json!({
            "detail": {"status": 2, "userId": "", "fileId": 0, "flag": true}
        }))
        .expect("event should parse");

        assert_eq!(event.detail_text("status").as_deref(), Some("2"));
        assert_eq!(event.detail_text("flag").as_deref(), Some("true"));
        assert!(event.user_id().is_none());
        assert_eq!(event.detail_text_or_unknown("fileId"), "unknown");
    }

    #[test]
    fn rejects_non_object_payload() {
        let error = BusEvent::from_value(json!(["not", "an", "event"]))
            .expect_err("array payload should fail");
        assert!(matches!(error, EnvelopeError::NotAnObject));
    }

    #[test]
    fn rejects_malformed_json_body() {
        let error = BusEvent::from_json_str("{not json").expect_err("bad json should fail");
        assert!(error.to_string().contains("malformed event payload"));
    }

    #[test]
    fn detail_error_ignores_empty_values() {
        let mut event = BusEvent::from_value(json!({"detail": {"error": null}}))
            .expect("event should parse");
        assert!(event.detail_error().is_none());

        event.detail = json!({"error": {"code": "E42"}});
        assert_eq!(event.detail_error(), Some(&json!({"code": "E42"})));
    }
}
