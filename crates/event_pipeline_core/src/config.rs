use thiserror::Error;

use crate::metrics::{DEAD_LETTER_NAMESPACE, EVENTS_NAMESPACE};

pub const DEFAULT_FAILED_EVENTS_BUCKET: &str = "eventbridge-failed-events";
pub const DEFAULT_EVENT_BUS_NAME: &str = "default";
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got '{value}'")]
    InvalidInteger { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetterConfig {
    pub alert_topic_arn: Option<String>,
    pub failed_events_bucket: String,
    pub event_bus_name: String,
    pub max_retry_attempts: u32,
    pub metrics_namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLoggerConfig {
    pub metrics_namespace: String,
}

impl Default for DeadLetterConfig {
    fn default() -> Self {
        Self {
            alert_topic_arn: None,
            failed_events_bucket: DEFAULT_FAILED_EVENTS_BUCKET.to_string(),
            event_bus_name: DEFAULT_EVENT_BUS_NAME.to_string(),
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            metrics_namespace: DEAD_LETTER_NAMESPACE.to_string(),
        }
    }
}

impl Default for EventLoggerConfig {
    fn default() -> Self {
        Self {
            metrics_namespace: EVENTS_NAMESPACE.to_string(),
        }
    }
}

impl DeadLetterConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let max_retry_attempts = match non_blank(&lookup, "MAX_RETRY_ATTEMPTS") {
            Some(raw) => parse_positive(&raw, "MAX_RETRY_ATTEMPTS")?,
            None => defaults.max_retry_attempts,
        };

        Ok(Self {
            alert_topic_arn: non_blank(&lookup, "ALERT_TOPIC_ARN"),
            failed_events_bucket: non_blank(&lookup, "FAILED_EVENTS_BUCKET")
                .unwrap_or(defaults.failed_events_bucket),
            event_bus_name: non_blank(&lookup, "EVENT_BUS_NAME")
                .unwrap_or(defaults.event_bus_name),
            max_retry_attempts,
            metrics_namespace: non_blank(&lookup, "DEAD_LETTER_METRICS_NAMESPACE")
                .unwrap_or(defaults.metrics_namespace),
        })
    }
}

impl EventLoggerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            metrics_namespace: non_blank(&lookup, "EVENT_METRICS_NAMESPACE")
                .unwrap_or_else(|| EVENTS_NAMESPACE.to_string()),
        }
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_positive(raw: &str, name: &'static str) -> Result<u32, ConfigError> {
    match raw.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidInteger {
            name,
            value: raw.to_string(),
        }),
    }
}
