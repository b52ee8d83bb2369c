use async_trait::async_trait;
use matcher_core::ports::{NotificationBus, NotificationPayload};
use tokio::sync::Mutex;

/// In-process bus double: captures every `publish` call so tests can assert
/// on what the engine announced without a running Redis.
#[derive(Default)]
pub struct RecordingNotificationBus {
    published: Mutex<Vec<(String, NotificationPayload)>>,
}

impl RecordingNotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn drain(&self) -> Vec<(String, NotificationPayload)> {
        std::mem::take(&mut *self.published.lock().await)
    }

    pub async fn len(&self) -> usize {
        self.published.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.published.lock().await.is_empty()
    }
}

#[async_trait]
impl NotificationBus for RecordingNotificationBus {
    async fn publish(&self, topic: &str, payload: NotificationPayload) {
        self.published
            .lock()
            .await
            .push((topic.to_string(), payload));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use matcher_core::ports::TripSnapshot;

    fn trip() -> TripSnapshot {
        TripSnapshot {
            trip_id: "TRIP1".into(),
            status: "ACTIVE".into(),
            fare_each: 12.5,
            no_of_passengers: 2,
            total_luggage: 2,
            cab_id: None,
            created_at: Utc::now(),
            ride_requests: vec![],
        }
    }

    #[tokio::test]
    async fn records_every_publish_in_order() {
        let bus = RecordingNotificationBus::new();
        bus.publish("rider-1", NotificationPayload::RideMatched { trip: trip() })
            .await;
        bus.publish(
            "rider-2",
            NotificationPayload::RiderLeft {
                trip_id: "TRIP1".into(),
                cancelled_user_id: "rider-3".into(),
                updated_trip: None,
            },
        )
        .await;
        let recorded = bus.drain().await;
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].0, "rider-1");
        assert_eq!(recorded[1].0, "rider-2");
        assert!(bus.is_empty().await);
    }
}
