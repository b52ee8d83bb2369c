use async_trait::async_trait;
use matcher_core::ports::{NotificationBus, NotificationPayload};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct BusConfig {
    pub url: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

/// Redis pub/sub-backed bus. Only the publish side is exposed through the
/// `NotificationBus` trait; subscribing is a transport-layer concern outside
/// this crate's scope, so `subscribe` is a plain inherent method for whatever
/// caller wants to drain a channel directly.
pub struct RedisNotificationBus {
    conn: ConnectionManager,
    client: redis::Client,
}

impl RedisNotificationBus {
    pub async fn connect(config: BusConfig) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(config.url.as_str())?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn, client })
    }

    /// Opens a dedicated pub/sub connection subscribed to `topic`. Redis
    /// requires pub/sub connections to be separate from command connections.
    pub async fn subscribe(
        &self,
        topic: &str,
    ) -> Result<redis::aio::PubSub, redis::RedisError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(topic).await?;
        Ok(pubsub)
    }
}

#[async_trait]
impl NotificationBus for RedisNotificationBus {
    async fn publish(&self, topic: &str, payload: NotificationPayload) {
        let body = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(e) => {
                warn!(topic, error = %e, "failed to serialize notification payload");
                return;
            }
        };
        let mut conn = self.conn.clone();
        if let Err(e) = conn.publish::<_, _, i64>(topic, body).await {
            warn!(topic, error = %e, "notification publish failed, dropping");
        }
    }
}
