use std::collections::HashMap;

pub const RETRYABLE_FAILURE_REASONS: [&str; 4] = [
    "Lambda throttled",
    "Target unavailable",
    "Timeout",
    "Rate exceeded",
];

pub const CRITICAL_EVENT_TYPES: [&str; 3] = [
    "Transcription Completed",
    "User Registered",
    "Payment Processed",
];

pub const RECEIVE_COUNT_ATTRIBUTE: &str = "ApproximateReceiveCount";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadLetterAction {
    Republish,
    Archive,
}

/// Number of times the queue has delivered the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveCount {
    Known(u32),
    /// The attribute was present but unreadable; treated as past any limit.
    Unreadable,
}

impl ReceiveCount {
    pub fn attempts(self) -> Option<u32> {
        match self {
            Self::Known(count) => Some(count),
            Self::Unreadable => None,
        }
    }
}

pub fn receive_count(attributes: &HashMap<String, String>) -> ReceiveCount {
    match attributes.get(RECEIVE_COUNT_ATTRIBUTE) {
        None => ReceiveCount::Known(1),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map(ReceiveCount::Known)
            .unwrap_or(ReceiveCount::Unreadable),
    }
}

pub fn is_retryable(failure_reason: &str) -> bool {
    let reason = failure_reason.to_lowercase();
    RETRYABLE_FAILURE_REASONS
        .iter()
        .any(|candidate| reason.contains(&candidate.to_lowercase()))
}

pub fn is_critical_event(detail_type: Option<&str>) -> bool {
    detail_type
        .map(|value| CRITICAL_EVENT_TYPES.contains(&value))
        .unwrap_or(false)
}

pub fn decide(
    receive_count: ReceiveCount,
    max_retry_attempts: u32,
    failure_reason: &str,
) -> DeadLetterAction {
    let under_limit = match receive_count {
        ReceiveCount::Known(count) => count < max_retry_attempts,
        ReceiveCount::Unreadable => false,
    };

    if under_limit && is_retryable(failure_reason) {
        DeadLetterAction::Republish
    } else {
        DeadLetterAction::Archive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes(count: &str) -> HashMap<String, String> {
        HashMap::from([(RECEIVE_COUNT_ATTRIBUTE.to_string(), count.to_string())])
    }

    #[test]
    fn retryable_match_is_case_insensitive_substring() {
        assert!(is_retryable("lambda THROTTLED while invoking target"));
        assert!(is_retryable("Request Timeout after 30s"));
        assert!(is_retryable("rate exceeded"));
        assert!(!is_retryable("Invalid parameter"));
        assert!(!is_retryable("Unknown"));
    }

    #[test]
    fn critical_types_require_exact_match() {
        assert!(is_critical_event(Some("Payment Processed")));
        assert!(!is_critical_event(Some("payment processed")));
        assert!(!is_critical_event(Some("Audio Uploaded")));
        assert!(!is_critical_event(None));
    }

    #[test]
    fn receive_count_defaults_to_first_delivery() {
        assert_eq!(receive_count(&HashMap::new()), ReceiveCount::Known(1));
        assert_eq!(receive_count(&attributes("2")), ReceiveCount::Known(2));
        assert_eq!(receive_count(&attributes("two")), ReceiveCount::Unreadable);
    }

    #[test]
    fn republishes_retryable_failures_under_the_limit() {
        assert_eq!(
            decide(ReceiveCount::Known(2), 3, "Target unavailable"),
            DeadLetterAction::Republish
        );
        assert_eq!(
            decide(ReceiveCount::Known(3), 3, "Target unavailable"),
            DeadLetterAction::Archive
        );
        assert_eq!(
            decide(ReceiveCount::Known(1), 3, "Malformed payload"),
            DeadLetterAction::Archive
        );
        assert_eq!(
            decide(ReceiveCount::Unreadable, 3, "Timeout"),
            DeadLetterAction::Archive
        );
    }
}
