//! Live fan-out of newly created posts to subscribed connections.

use crate::db::post_repo;
use crate::error::AppResult;
use crate::events::PostEvent;
use crate::metrics;
use crate::models::PostWithAuthor;
use crate::websocket::messages::ServerMessage;
use crate::websocket::registry::SubscriptionRegistry;
use sqlx::PgPool;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Clone)]
pub struct DispatchService {
    db: PgPool,
    registry: SubscriptionRegistry,
}

impl DispatchService {
    pub fn new(db: PgPool, registry: SubscriptionRegistry) -> Self {
        Self { db, registry }
    }

    /// Consume post-created events until the channel closes. Nothing here is
    /// fatal: a failed dispatch is logged and the loop moves on.
    pub async fn run(self, mut events: UnboundedReceiver<PostEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                PostEvent::Created { post_id } => {
                    if let Err(e) = self.dispatch_new_post(post_id).await {
                        tracing::error!(post_id, error = %e, "live dispatch failed");
                    }
                }
            }
        }
        tracing::info!("post event channel closed; live dispatch stopping");
    }

    /// Load the post and push it to every spatially matching connection.
    /// A post deleted between creation and dispatch is skipped silently;
    /// no caller is waiting on this path.
    pub async fn dispatch_new_post(&self, post_id: i32) -> AppResult<()> {
        metrics::DISPATCHED_POSTS.inc();

        let Some(post) = post_repo::find_with_author(&self.db, post_id).await? else {
            tracing::warn!(post_id, "post gone before fan-out");
            return Ok(());
        };

        let delivered = fan_out(&self.registry, &post).await?;
        tracing::debug!(post_id, delivered, "fan-out complete");
        Ok(())
    }
}

/// Push one loaded post to every connection whose region contains its
/// coordinates. Fan-out is spatial only: a subscription's time window bounds
/// the initial snapshot, not live delivery. A send that finds the peer gone
/// drops that connection's entry and never stops the pass. Returns the
/// number of connections reached.
pub async fn fan_out(
    registry: &SubscriptionRegistry,
    post: &PostWithAuthor,
) -> AppResult<usize> {
    let payload = ServerMessage::NewPost { post: post.clone() }.to_json()?;

    let mut delivered = 0;
    for (connection_id, subscription) in registry.subscriptions().await {
        if !subscription.region.contains(post.latitude, post.longitude) {
            continue;
        }

        if registry.send(connection_id, payload.clone()).await {
            delivered += 1;
            metrics::DISPATCH_DELIVERIES.inc();
        } else {
            metrics::DISPATCH_SEND_FAILURES.inc();
            tracing::debug!(
                connection = %connection_id,
                "peer gone during fan-out; dropping its subscription"
            );
            registry.disconnect(connection_id).await;
        }
    }

    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoPoint, PostAuthor, Region, Subscription, TimeWindow};
    use chrono::TimeZone;
    use tokio::sync::mpsc::error::TryRecvError;

    fn region(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Region {
        Region {
            location_from: GeoPoint {
                latitude: lat_min,
                longitude: lon_max,
            },
            location_to: GeoPoint {
                latitude: lat_max,
                longitude: lon_min,
            },
        }
    }

    fn subscription(region: Region) -> Subscription {
        Subscription {
            region,
            time: TimeWindow {
                from: 1000,
                to: 2000,
            },
        }
    }

    fn post_at(latitude: f64, longitude: f64) -> PostWithAuthor {
        PostWithAuthor {
            id: 1,
            description: "hello from the field".to_string(),
            is_public: true,
            latitude,
            longitude,
            views: 0,
            created_at: chrono::Utc.timestamp_opt(1500, 0).unwrap(),
            user: PostAuthor {
                fullname: "Ada Lovelace".to_string(),
                profile_photo: None,
            },
            photos: vec![],
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn no_subscribers_means_no_sends() {
        let registry = SubscriptionRegistry::new();

        let delivered = fan_out(&registry, &post_at(5.0, 15.0)).await.unwrap();

        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn only_the_matching_region_receives() {
        let registry = SubscriptionRegistry::new();

        let (a, mut rx_a) = registry.connect().await;
        registry
            .set_subscription(a, subscription(region(0.0, 20.0, 10.0, 20.0)))
            .await;

        let (b, mut rx_b) = registry.connect().await;
        registry
            .set_subscription(b, subscription(region(-50.0, -40.0, -120.0, -110.0)))
            .await;

        let delivered = fan_out(&registry, &post_at(5.0, 15.0)).await.unwrap();

        assert_eq!(delivered, 1);
        let frame = rx_a.try_recv().unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "new post");
        assert_eq!(value["post"]["latitude"], 5.0);

        assert_eq!(rx_b.try_recv().unwrap_err(), TryRecvError::Empty);
    }

    #[tokio::test]
    async fn disconnected_client_is_never_contacted() {
        let registry = SubscriptionRegistry::new();

        let (a, mut rx_a) = registry.connect().await;
        registry
            .set_subscription(a, subscription(region(0.0, 20.0, 10.0, 20.0)))
            .await;
        registry.disconnect(a).await;

        let delivered = fan_out(&registry, &post_at(5.0, 15.0)).await.unwrap();

        assert_eq!(delivered, 0);
        assert_eq!(rx_a.try_recv().unwrap_err(), TryRecvError::Disconnected);
    }

    #[tokio::test]
    async fn one_dead_peer_does_not_block_the_rest() {
        let registry = SubscriptionRegistry::new();
        let shared = region(0.0, 20.0, 10.0, 20.0);

        let (a, rx_a) = registry.connect().await;
        registry.set_subscription(a, subscription(shared)).await;
        drop(rx_a);

        let (b, mut rx_b) = registry.connect().await;
        registry.set_subscription(b, subscription(shared)).await;

        let delivered = fan_out(&registry, &post_at(5.0, 15.0)).await.unwrap();

        assert_eq!(delivered, 1);
        assert!(rx_b.try_recv().is_ok());

        // The dead peer's subscription is gone.
        let remaining = registry.subscriptions().await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0, b);
    }

    #[tokio::test]
    async fn fan_out_checks_space_but_not_time() {
        let registry = SubscriptionRegistry::new();

        let (a, mut rx_a) = registry.connect().await;
        registry
            .set_subscription(a, subscription(region(0.0, 20.0, 10.0, 20.0)))
            .await;

        // Created long after the subscribed window [1000, 2000]: still
        // delivered, the window only bounds the snapshot query.
        let mut post = post_at(5.0, 15.0);
        post.created_at = chrono::Utc.timestamp_opt(999_999, 0).unwrap();

        let delivered = fan_out(&registry, &post).await.unwrap();

        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_ok());
    }

    #[tokio::test]
    async fn boundary_posts_are_delivered() {
        let registry = SubscriptionRegistry::new();

        let (a, mut rx_a) = registry.connect().await;
        registry
            .set_subscription(a, subscription(region(0.0, 20.0, 10.0, 20.0)))
            .await;

        // Exactly on the rectangle's corner.
        let delivered = fan_out(&registry, &post_at(0.0, 10.0)).await.unwrap();

        assert_eq!(delivered, 1);
        assert!(rx_a.try_recv().is_ok());
    }
}
