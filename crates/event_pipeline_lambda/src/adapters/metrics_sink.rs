use async_trait::async_trait;
use event_pipeline_core::metrics::MetricDatum;

use super::AdapterError;

#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn put_metric_data(
        &self,
        namespace: &str,
        data: &[MetricDatum],
    ) -> Result<(), AdapterError>;
}
