use super::{EventNotifier, PostPublished};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Kafka producer wrapper for post lifecycle events.
#[derive(Clone)]
pub struct KafkaEventNotifier {
    inner: Arc<FutureProducer>,
    topic: String,
    send_timeout: Duration,
}

impl KafkaEventNotifier {
    pub fn new(brokers: &str, topic: &str, send_timeout: Duration) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("message.timeout.ms", send_timeout.as_millis().to_string())
            .create()
            .with_context(|| format!("Failed to create Kafka producer for '{}'", topic))?;

        tracing::info!(brokers = %brokers, topic = %topic, "Kafka event notifier initialized");

        Ok(Self {
            inner: Arc::new(producer),
            topic: topic.to_string(),
            send_timeout,
        })
    }
}

#[async_trait]
impl EventNotifier for KafkaEventNotifier {
    async fn notify_published(&self, post_id: Uuid, slug: &str, title: &str) -> Result<()> {
        let event = PostPublished::new(post_id, slug, title);
        let payload =
            serde_json::to_string(&event).context("Failed to serialize PostPublished event")?;
        let key = post_id.to_string();

        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);

        self.inner
            .send(record, self.send_timeout)
            .await
            .map_err(|(err, _)| anyhow::anyhow!("Failed to publish PostPublished event: {}", err))?;

        tracing::debug!(%post_id, slug = %slug, topic = %self.topic, "PostPublished event delivered");
        Ok(())
    }
}
