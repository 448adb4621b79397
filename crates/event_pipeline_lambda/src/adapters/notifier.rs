use async_trait::async_trait;
use event_pipeline_core::alert::AlertMessage;

use super::AdapterError;

#[async_trait]
pub trait AlertNotifier: Send + Sync {
    async fn publish(&self, topic_arn: &str, alert: &AlertMessage) -> Result<(), AdapterError>;
}
