use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::envelope::BusEvent;
use crate::policy::ReceiveCount;
use crate::UNKNOWN;

/// Notification subjects longer than this are rejected by SNS.
pub const MAX_SUBJECT_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub subject: String,
    pub message: String,
    /// String-typed notification attributes.
    pub attributes: BTreeMap<String, String>,
}

pub fn build_critical_alert(
    event: &BusEvent,
    receive_count: ReceiveCount,
    bucket: &str,
    archive_key: &str,
) -> AlertMessage {
    let detail_type = event.detail_type_or_unknown();
    let attempts = receive_count
        .attempts()
        .map(|count| count.to_string())
        .unwrap_or_else(|| UNKNOWN.to_string());
    let detail =
        serde_json::to_string_pretty(&event.detail).unwrap_or_else(|_| "{}".to_string());

    let message = format!(
        "Critical event processing failed after {attempts} attempts.\n\
         \n\
         Event Details:\n\
         - Event ID: {event_id}\n\
         - Event Type: {detail_type}\n\
         - Source: {source}\n\
         - User ID: {user_id}\n\
         - Failure Reason: {reason}\n\
         - Archived Location: s3://{bucket}/{archive_key}\n\
         \n\
         Event Detail:\n\
         {detail}\n\
         \n\
         Please investigate immediately.",
        event_id = event.id_or_unknown(),
        source = event.source_or_unknown(),
        user_id = event.user_id().unwrap_or(Cow::Borrowed("N/A")),
        reason = event.failure_reason(),
    );

    AlertMessage {
        subject: truncate_chars(
            &format!("Critical Event Failed: {detail_type}"),
            MAX_SUBJECT_CHARS,
        ),
        message,
        attributes: BTreeMap::from([
            ("eventType".to_string(), detail_type.to_string()),
            ("eventId".to_string(), event.id_or_unknown().to_string()),
        ]),
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
