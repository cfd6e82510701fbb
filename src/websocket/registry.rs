//! Per-connection subscription state for the near-me channel.
//!
//! The registry is the only shared mutable state on the realtime path. It is
//! a cloneable handle over a locked map; locks are held only while touching
//! the map itself, never across queries or sends to the network.

use crate::models::Subscription;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Unique identifier for one live connection, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct ConnectionEntry {
    sender: UnboundedSender<String>,
    subscription: Option<Subscription>,
}

#[derive(Default, Clone)]
pub struct SubscriptionRegistry {
    inner: Arc<RwLock<HashMap<ConnectionId, ConnectionEntry>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live connection. Returns its id and the receiving end of
    /// its outbound channel; the connection starts without a subscription
    /// and receives nothing until it asks to view a region.
    pub async fn connect(&self) -> (ConnectionId, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let id = ConnectionId::new();

        let mut guard = self.inner.write().await;
        guard.insert(
            id,
            ConnectionEntry {
                sender: tx,
                subscription: None,
            },
        );
        tracing::debug!(connection = %id, total = guard.len(), "connection registered");

        (id, rx)
    }

    /// Record the connection's current viewport, replacing any prior one.
    /// Harmless to repeat; returns false when the connection is gone.
    pub async fn set_subscription(&self, id: ConnectionId, subscription: Subscription) -> bool {
        let mut guard = self.inner.write().await;
        match guard.get_mut(&id) {
            Some(entry) => {
                entry.subscription = Some(subscription);
                true
            }
            None => false,
        }
    }

    /// Drop a connection and its subscription. No-op when already gone.
    pub async fn disconnect(&self, id: ConnectionId) {
        let mut guard = self.inner.write().await;
        if guard.remove(&id).is_some() {
            tracing::debug!(connection = %id, remaining = guard.len(), "connection removed");
        }
    }

    /// Snapshot of every connection that currently has a subscription.
    pub async fn subscriptions(&self) -> Vec<(ConnectionId, Subscription)> {
        let guard = self.inner.read().await;
        guard
            .iter()
            .filter_map(|(id, entry)| entry.subscription.map(|sub| (*id, sub)))
            .collect()
    }

    /// Queue a payload to one connection. Returns false when the connection
    /// is gone or its receiving side has been dropped.
    pub async fn send(&self, id: ConnectionId, payload: String) -> bool {
        let sender = {
            let guard = self.inner.read().await;
            match guard.get(&id) {
                Some(entry) => entry.sender.clone(),
                None => return false,
            }
        };
        sender.send(payload).is_ok()
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoPoint, Region, TimeWindow};

    fn subscription(lon_min: f64, lon_max: f64) -> Subscription {
        Subscription {
            region: Region {
                location_from: GeoPoint {
                    latitude: 0.0,
                    longitude: lon_max,
                },
                location_to: GeoPoint {
                    latitude: 20.0,
                    longitude: lon_min,
                },
            },
            time: TimeWindow {
                from: 1000,
                to: 2000,
            },
        }
    }

    #[tokio::test]
    async fn set_subscription_is_idempotent() {
        let registry = SubscriptionRegistry::new();
        let (id, _rx) = registry.connect().await;

        assert!(registry.set_subscription(id, subscription(10.0, 20.0)).await);
        assert!(registry.set_subscription(id, subscription(10.0, 20.0)).await);

        let subs = registry.subscriptions().await;
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].0, id);
    }

    #[tokio::test]
    async fn latest_subscription_wins() {
        let registry = SubscriptionRegistry::new();
        let (id, _rx) = registry.connect().await;

        registry.set_subscription(id, subscription(10.0, 20.0)).await;
        registry.set_subscription(id, subscription(30.0, 40.0)).await;

        let subs = registry.subscriptions().await;
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].1.region.longitude_min(), 30.0);
    }

    #[tokio::test]
    async fn disconnect_removes_the_entry() {
        let registry = SubscriptionRegistry::new();
        let (id, _rx) = registry.connect().await;
        registry.set_subscription(id, subscription(10.0, 20.0)).await;

        registry.disconnect(id).await;

        assert!(registry.subscriptions().await.is_empty());
        assert_eq!(registry.connection_count().await, 0);

        // Disconnecting again is harmless.
        registry.disconnect(id).await;
    }

    #[tokio::test]
    async fn subscribing_a_gone_connection_fails() {
        let registry = SubscriptionRegistry::new();
        let (id, _rx) = registry.connect().await;
        registry.disconnect(id).await;

        assert!(!registry.set_subscription(id, subscription(10.0, 20.0)).await);
    }

    #[tokio::test]
    async fn connections_without_subscription_are_not_enumerated() {
        let registry = SubscriptionRegistry::new();
        let (_id, _rx) = registry.connect().await;

        assert_eq!(registry.connection_count().await, 1);
        assert!(registry.subscriptions().await.is_empty());
    }

    #[tokio::test]
    async fn send_reports_a_dropped_receiver() {
        let registry = SubscriptionRegistry::new();
        let (id, rx) = registry.connect().await;
        drop(rx);

        assert!(!registry.send(id, "hello".to_string()).await);
    }

    #[tokio::test]
    async fn send_delivers_to_a_live_receiver() {
        let registry = SubscriptionRegistry::new();
        let (id, mut rx) = registry.connect().await;

        assert!(registry.send(id, "hello".to_string()).await);
        assert_eq!(rx.recv().await.as_deref(), Some("hello"));
    }
}
