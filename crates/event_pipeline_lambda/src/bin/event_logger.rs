use chrono::Utc;
use event_pipeline_core::config::EventLoggerConfig;
use event_pipeline_lambda::adapters::aws::{AwsClients, CloudWatchMetricsSink};
use event_pipeline_lambda::handlers::event_logger::{handle_observed_event, LoggerResponse};
use event_pipeline_lambda::logging::init_logging;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

struct RuntimeDependencies {
    config: EventLoggerConfig,
    metrics: CloudWatchMetricsSink,
}

async fn handle_request(
    deps: &RuntimeDependencies,
    event: LambdaEvent<Value>,
) -> Result<LoggerResponse, Error> {
    Ok(handle_observed_event(event.payload, &deps.config, &deps.metrics, Utc::now()).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let clients = AwsClients::load().await;
    let deps = RuntimeDependencies {
        config: EventLoggerConfig::from_env(),
        metrics: clients.metrics_sink(),
    };

    let deps = &deps;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        handle_request(deps, event).await
    }))
    .await
}
