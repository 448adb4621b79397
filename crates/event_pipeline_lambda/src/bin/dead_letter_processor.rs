use chrono::Utc;
use event_pipeline_core::config::DeadLetterConfig;
use event_pipeline_lambda::adapters::aws::{
    AwsClients, CloudWatchMetricsSink, EventBridgePublisher, S3ArchiveStore, SnsAlertNotifier,
};
use event_pipeline_lambda::handlers::dead_letter::{
    handle_dead_letter_event, DeadLetterServices, SqsBatchResponse,
};
use event_pipeline_lambda::logging::init_logging;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct RuntimeDependencies {
    config: DeadLetterConfig,
    publisher: EventBridgePublisher,
    archive: S3ArchiveStore,
    notifier: SnsAlertNotifier,
    metrics: CloudWatchMetricsSink,
}

impl RuntimeDependencies {
    fn services(&self) -> DeadLetterServices<'_> {
        DeadLetterServices {
            publisher: &self.publisher,
            archive: &self.archive,
            notifier: &self.notifier,
            metrics: &self.metrics,
        }
    }
}

async fn handle_request(
    deps: &RuntimeDependencies,
    event: LambdaEvent<Value>,
) -> Result<SqsBatchResponse, Error> {
    handle_dead_letter_event(&event.payload, &deps.config, deps.services(), Utc::now())
        .await
        .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let config = DeadLetterConfig::from_env()?;
    let clients = AwsClients::load().await;
    let deps = RuntimeDependencies {
        config,
        publisher: clients.event_publisher(),
        archive: clients.archive_store(),
        notifier: clients.alert_notifier(),
        metrics: clients.metrics_sink(),
    };

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(deps, event).await
    }))
    .await
}
