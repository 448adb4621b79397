use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudwatch::primitives::DateTime as CloudWatchDateTime;
use aws_sdk_cloudwatch::types::{
    Dimension, MetricDatum as CloudWatchDatum, StandardUnit,
};
use aws_sdk_eventbridge::types::PutEventsRequestEntry;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_sns::types::MessageAttributeValue;
use event_pipeline_core::alert::AlertMessage;
use event_pipeline_core::catalog::BusEntry;
use event_pipeline_core::metrics::{MetricDatum, MetricUnit};

use super::{
    AdapterError, AlertNotifier, ArchiveObject, ArchiveStore, EventPublisher, MetricsSink,
    PutEventsEntryResult, PutEventsOutcome,
};

/// SDK clients built once per execution environment from the default chain.
#[derive(Clone)]
pub struct AwsClients {
    pub eventbridge: aws_sdk_eventbridge::Client,
    pub s3: aws_sdk_s3::Client,
    pub sns: aws_sdk_sns::Client,
    pub cloudwatch: aws_sdk_cloudwatch::Client,
}

impl AwsClients {
    pub async fn load() -> Self {
        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self {
            eventbridge: aws_sdk_eventbridge::Client::new(&config),
            s3: aws_sdk_s3::Client::new(&config),
            sns: aws_sdk_sns::Client::new(&config),
            cloudwatch: aws_sdk_cloudwatch::Client::new(&config),
        }
    }

    pub fn event_publisher(&self) -> EventBridgePublisher {
        EventBridgePublisher {
            client: self.eventbridge.clone(),
        }
    }

    pub fn archive_store(&self) -> S3ArchiveStore {
        S3ArchiveStore {
            client: self.s3.clone(),
        }
    }

    pub fn alert_notifier(&self) -> SnsAlertNotifier {
        SnsAlertNotifier {
            client: self.sns.clone(),
        }
    }

    pub fn metrics_sink(&self) -> CloudWatchMetricsSink {
        CloudWatchMetricsSink {
            client: self.cloudwatch.clone(),
        }
    }
}

pub struct EventBridgePublisher {
    client: aws_sdk_eventbridge::Client,
}

impl EventBridgePublisher {
    pub fn new(client: aws_sdk_eventbridge::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EventPublisher for EventBridgePublisher {
    async fn put_events(&self, entries: &[BusEntry]) -> Result<PutEventsOutcome, AdapterError> {
        let request_entries = entries
            .iter()
            .map(|entry| {
                PutEventsRequestEntry::builder()
                    .set_source(entry.source.clone())
                    .set_detail_type(entry.detail_type.clone())
                    .detail(entry.detail_json())
                    .set_event_bus_name(entry.event_bus_name.clone())
                    .build()
            })
            .collect::<Vec<_>>();

        let output = self
            .client
            .put_events()
            .set_entries(Some(request_entries))
            .send()
            .await
            .map_err(|error| {
                AdapterError::request(
                    "eventbridge",
                    "PutEvents",
                    aws_sdk_eventbridge::error::DisplayErrorContext(&error),
                )
            })?;

        let entries = output
            .entries()
            .iter()
            .map(|entry| PutEventsEntryResult {
                event_id: entry.event_id().map(str::to_string),
                error_code: entry.error_code().map(str::to_string),
                error_message: entry.error_message().map(str::to_string),
            })
            .collect::<Vec<_>>();
        let failed_entry_count = entries
            .iter()
            .filter(|entry| entry.error_code.is_some())
            .count();

        Ok(PutEventsOutcome {
            failed_entry_count,
            entries,
        })
    }
}

pub struct S3ArchiveStore {
    client: aws_sdk_s3::Client,
}

#[async_trait]
impl ArchiveStore for S3ArchiveStore {
    async fn put_object(&self, object: ArchiveObject) -> Result<(), AdapterError> {
        let metadata: HashMap<String, String> = object.metadata.into_iter().collect();
        self.client
            .put_object()
            .bucket(object.bucket)
            .key(object.key)
            .body(ByteStream::from(object.body))
            .content_type(object.content_type)
            .set_metadata(Some(metadata))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                AdapterError::request(
                    "s3",
                    "PutObject",
                    aws_sdk_s3::error::DisplayErrorContext(&error),
                )
            })
    }
}

pub struct SnsAlertNotifier {
    client: aws_sdk_sns::Client,
}

#[async_trait]
impl AlertNotifier for SnsAlertNotifier {
    async fn publish(&self, topic_arn: &str, alert: &AlertMessage) -> Result<(), AdapterError> {
        let mut request = self
            .client
            .publish()
            .topic_arn(topic_arn)
            .subject(&alert.subject)
            .message(&alert.message);

        for (name, value) in &alert.attributes {
            let attribute = MessageAttributeValue::builder()
                .data_type("String")
                .string_value(value)
                .build()
                .map_err(|error| AdapterError::invalid_shape("sns", "MessageAttributeValue", error))?;
            request = request.message_attributes(name, attribute);
        }

        request.send().await.map(|_| ()).map_err(|error| {
            AdapterError::request(
                "sns",
                "Publish",
                aws_sdk_sns::error::DisplayErrorContext(&error),
            )
        })
    }
}

pub struct CloudWatchMetricsSink {
    client: aws_sdk_cloudwatch::Client,
}

#[async_trait]
impl MetricsSink for CloudWatchMetricsSink {
    async fn put_metric_data(
        &self,
        namespace: &str,
        data: &[MetricDatum],
    ) -> Result<(), AdapterError> {
        let metric_data: Vec<CloudWatchDatum> = data.iter().map(to_cloudwatch_datum).collect();

        self.client
            .put_metric_data()
            .namespace(namespace)
            .set_metric_data(Some(metric_data))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                AdapterError::request(
                    "cloudwatch",
                    "PutMetricData",
                    aws_sdk_cloudwatch::error::DisplayErrorContext(&error),
                )
            })
    }
}

fn to_cloudwatch_datum(datum: &MetricDatum) -> CloudWatchDatum {
    let dimensions: Vec<Dimension> = datum
        .dimensions
        .iter()
        .map(|dimension| {
            Dimension::builder()
                .name(&dimension.name)
                .value(&dimension.value)
                .build()
        })
        .collect();

    let unit = match datum.unit {
        MetricUnit::Count => StandardUnit::Count,
        MetricUnit::Seconds => StandardUnit::Seconds,
    };

    CloudWatchDatum::builder()
        .metric_name(&datum.name)
        .value(datum.value)
        .unit(unit)
        .timestamp(CloudWatchDateTime::from_millis(
            datum.timestamp.timestamp_millis(),
        ))
        .set_dimensions(if dimensions.is_empty() {
            None
        } else {
            Some(dimensions)
        })
        .build()
}
