//! Broadcast hub for live subscribers.

use std::{collections::HashMap, sync::Arc};

use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::Subscriber;

/// Subscriber identifier.
pub type SubscriberId = Uuid;

/// Fan-out registry of live subscribers.
///
/// Membership changes go through one lock. A broadcast snapshots the
/// membership, writes outside that lock, then evicts every subscriber whose
/// write failed. Broadcast passes are serialized by a second lock so each
/// subscriber sees messages in the order they were issued.
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<SubscriberId, Arc<dyn Subscriber>>>,
    delivery: Mutex<()>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            delivery: Mutex::new(()),
        }
    }

    /// Register a subscriber whose handshake has completed.
    pub async fn connect(&self, subscriber: Arc<dyn Subscriber>) -> SubscriberId {
        let id = Uuid::new_v4();
        let count = {
            let mut subscribers = self.subscribers.lock().await;
            subscribers.insert(id, subscriber);
            subscribers.len()
        };
        tracing::debug!(subscriber = %id, count, "Subscriber connected");
        id
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub async fn disconnect(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.lock().await.remove(&id).is_some();
        if removed {
            tracing::debug!(subscriber = %id, "Subscriber disconnected");
        }
        removed
    }

    /// Number of registered subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Serialize `message` once and write it to every subscriber.
    ///
    /// Subscribers whose write fails are evicted after the pass.
    pub async fn broadcast<T: Serialize + ?Sized>(&self, message: &T) {
        let json = match serde_json::to_string(message) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!("Failed to serialize broadcast: {e}");
                return;
            }
        };

        let _delivery = self.delivery.lock().await;

        let targets: Vec<(SubscriberId, Arc<dyn Subscriber>)> = self
            .subscribers
            .lock()
            .await
            .iter()
            .map(|(id, s)| (*id, Arc::clone(s)))
            .collect();

        if targets.is_empty() {
            tracing::trace!("No subscribers for broadcast");
            return;
        }

        let mut failed = Vec::new();
        for (id, subscriber) in &targets {
            if let Err(e) = subscriber.send(&json).await {
                tracing::debug!(subscriber = %id, "Dropping subscriber: {e}");
                failed.push(*id);
            }
        }

        if !failed.is_empty() {
            let mut subscribers = self.subscribers.lock().await;
            for id in &failed {
                subscribers.remove(id);
            }
        }

        tracing::debug!(
            delivered = targets.len() - failed.len(),
            evicted = failed.len(),
            "Broadcast complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::*;
    use crate::{StatusUpdate, SubscriberError};

    struct BrokenPipe;

    #[async_trait]
    impl Subscriber for BrokenPipe {
        async fn send(&self, _message: &str) -> Result<(), SubscriberError> {
            Err(SubscriberError::Send("broken pipe".into()))
        }
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_noop() {
        let hub = BroadcastHub::new();
        hub.broadcast(&StatusUpdate::ended()).await;
        assert_eq!(hub.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_subscriber() {
        let hub = BroadcastHub::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel::<String>();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel::<String>();
        hub.connect(Arc::new(tx_a)).await;
        hub.connect(Arc::new(tx_b)).await;

        hub.broadcast(&StatusUpdate::ended()).await;

        let expected = r#"{"state":"on_task","session_active":false}"#;
        assert_eq!(rx_a.recv().await.as_deref(), Some(expected));
        assert_eq!(rx_b.recv().await.as_deref(), Some(expected));
    }

    #[tokio::test]
    async fn test_failed_subscriber_is_evicted() {
        let hub = BroadcastHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        hub.connect(Arc::new(tx)).await;
        hub.connect(Arc::new(BrokenPipe)).await;

        hub.broadcast(&"first").await;
        assert_eq!(hub.subscriber_count().await, 1);

        hub.broadcast(&"second").await;
        assert_eq!(rx.recv().await.as_deref(), Some("\"first\""));
        assert_eq!(rx.recv().await.as_deref(), Some("\"second\""));
    }

    #[tokio::test]
    async fn test_closed_channel_is_evicted() {
        let hub = BroadcastHub::new();
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        hub.connect(Arc::new(tx)).await;
        drop(rx);

        hub.broadcast(&"hello").await;
        assert_eq!(hub.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let hub = BroadcastHub::new();
        let (tx, _rx) = mpsc::unbounded_channel::<String>();
        let id = hub.connect(Arc::new(tx)).await;

        assert!(hub.disconnect(id).await);
        assert!(!hub.disconnect(id).await);
        assert_eq!(hub.subscriber_count().await, 0);
    }

    #[tokio::test]
    async fn test_messages_arrive_in_issue_order() {
        let hub = Arc::new(BroadcastHub::new());
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        hub.connect(Arc::new(tx)).await;

        for i in 0..20 {
            hub.broadcast(&i).await;
        }

        for i in 0..20 {
            assert_eq!(rx.recv().await, Some(i.to_string()));
        }
    }
}
