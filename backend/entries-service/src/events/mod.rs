/// Post lifecycle events
///
/// The post service only knows the `EventNotifier` contract. Kafka delivery
/// lives in `kafka`; `NoopNotifier` stands in when events are disabled.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod kafka;

pub use kafka::KafkaEventNotifier;

pub const TYPE_POST_PUBLISHED: &str = "post.published";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPublishedPayload {
    pub post_id: Uuid,
    pub slug: String,
    pub title: String,
}

/// Envelope published when a draft goes live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPublished {
    #[serde(rename = "type")]
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub payload: PostPublishedPayload,
}

impl PostPublished {
    pub fn new(post_id: Uuid, slug: &str, title: &str) -> Self {
        Self {
            event_type: TYPE_POST_PUBLISHED.to_string(),
            timestamp: Utc::now(),
            payload: PostPublishedPayload {
                post_id,
                slug: slug.to_string(),
                title: title.to_string(),
            },
        }
    }
}

#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn notify_published(&self, post_id: Uuid, slug: &str, title: &str) -> anyhow::Result<()>;
}

/// Notifier used when event delivery is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl EventNotifier for NoopNotifier {
    async fn notify_published(&self, _post_id: Uuid, _slug: &str, _title: &str) -> anyhow::Result<()> {
        Ok(())
    }
}
