use async_trait::async_trait;
use event_pipeline_core::catalog::BusEntry;

use super::AdapterError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutEventsEntryResult {
    pub event_id: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutEventsOutcome {
    pub failed_entry_count: usize,
    pub entries: Vec<PutEventsEntryResult>,
}

impl PutEventsOutcome {
    pub fn failed_entries(&self) -> impl Iterator<Item = &PutEventsEntryResult> {
        self.entries.iter().filter(|entry| entry.error_code.is_some())
    }

    /// Turns per-entry rejections into an error naming each failure.
    pub fn into_result(self, service: &'static str) -> Result<Self, AdapterError> {
        if self.failed_entry_count == 0 {
            return Ok(self);
        }
        let details = self
            .failed_entries()
            .map(|entry| {
                format!(
                    "{}: {}",
                    entry.error_code.as_deref().unwrap_or("unknown"),
                    entry.error_message.as_deref().unwrap_or("no message"),
                )
            })
            .collect::<Vec<_>>()
            .join("; ");
        Err(AdapterError::Rejected {
            service,
            rejected: self.failed_entry_count,
            details,
        })
    }
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn put_events(&self, entries: &[BusEntry]) -> Result<PutEventsOutcome, AdapterError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_entries_become_errors() {
        let outcome = PutEventsOutcome {
            failed_entry_count: 1,
            entries: vec![
                PutEventsEntryResult {
                    event_id: Some("evt-1".to_string()),
                    ..Default::default()
                },
                PutEventsEntryResult {
                    event_id: None,
                    error_code: Some("InternalFailure".to_string()),
                    error_message: Some("try again".to_string()),
                },
            ],
        };

        let error = outcome
            .into_result("eventbridge")
            .expect_err("rejected entry should fail");
        assert_eq!(
            error.to_string(),
            "eventbridge rejected 1 of the submitted entries: InternalFailure: try again"
        );
    }

    #[test]
    fn accepted_entries_pass_through() {
        let outcome = PutEventsOutcome {
            failed_entry_count: 0,
            entries: vec![PutEventsEntryResult {
                event_id: Some("evt-1".to_string()),
                ..Default::default()
            }],
        };
        assert_eq!(
            outcome.clone().into_result("eventbridge").expect("should pass"),
            outcome
        );
    }
}
