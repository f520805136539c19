//! Newsletter worker
//!
//! Consumes `post.published` events from the post events topic and logs each
//! publication for the newsletter pipeline. Other event types are skipped.

use entries_service::events::{PostPublished, TYPE_POST_PUBLISHED};
use futures::StreamExt;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::ClientConfig;
use tracing::{debug, error, info, warn};

/// What to do with a consumed message once it has been looked at
#[derive(Debug, PartialEq, Eq)]
enum Disposition {
    Handled(PostPublished),
    Ignored(String),
    Malformed(String),
}

fn classify(payload: &[u8]) -> Disposition {
    let value: serde_json::Value = match serde_json::from_slice(payload) {
        Ok(v) => v,
        Err(e) => return Disposition::Malformed(e.to_string()),
    };

    let event_type = value
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or_default()
        .to_string();
    if event_type != TYPE_POST_PUBLISHED {
        return Disposition::Ignored(event_type);
    }

    match serde_json::from_value::<PostPublished>(value) {
        Ok(event) => Disposition::Handled(event),
        Err(e) => Disposition::Malformed(e.to_string()),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    entries_service::logging::init_tracing();

    let config = entries_service::Config::from_env().map_err(anyhow::Error::msg)?;
    let events = &config.events;

    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", events.brokers_csv())
        .set("group.id", &events.group_id)
        .set("enable.auto.commit", "false")
        .set("auto.offset.reset", "earliest")
        .set("session.timeout.ms", "45000")
        .create()?;
    consumer.subscribe(&[events.topic.as_str()])?;

    info!(
        topic = %events.topic,
        group_id = %events.group_id,
        "newsletter worker started"
    );

    let mut stream = consumer.stream();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("worker shutting down");
                break;
            }
            message = stream.next() => {
                let msg = match message {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        error!(error = %e, "Kafka consumer error");
                        continue;
                    }
                    None => {
                        warn!("message stream ended");
                        break;
                    }
                };

                match classify(msg.payload().unwrap_or_default()) {
                    Disposition::Handled(event) => info!(
                        post_id = %event.payload.post_id,
                        slug = %event.payload.slug,
                        title = %event.payload.title,
                        "post published event received"
                    ),
                    Disposition::Ignored(event_type) => {
                        debug!(event_type = %event_type, "ignoring event type")
                    }
                    // Redelivery would fail the same way; commit past it.
                    Disposition::Malformed(reason) => {
                        error!(offset = msg.offset(), reason = %reason, "invalid event body")
                    }
                }

                if let Err(e) = consumer.commit_message(&msg, CommitMode::Async) {
                    error!(error = %e, "failed to commit offset");
                }
            }
        }
    }

    Ok(())
}
