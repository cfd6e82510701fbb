//! Bulk query answering a client's "view this region" request.

use crate::db::post_repo;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::models::{PostWithAuthor, Region, Subscription, TimeWindow};
use crate::websocket::registry::{ConnectionId, SubscriptionRegistry};
use sqlx::PgPool;

#[derive(Clone)]
pub struct SnapshotService {
    db: PgPool,
    registry: SubscriptionRegistry,
}

impl SnapshotService {
    pub fn new(db: PgPool, registry: SubscriptionRegistry) -> Self {
        Self { db, registry }
    }

    /// All public posts currently inside the region and time window, bounds
    /// inclusive. On success the connection's subscription is replaced with
    /// this viewport so live fan-out starts covering it; the query and the
    /// subscription update are not atomic, so a post created in between may
    /// be missed.
    pub async fn posts_in_region(
        &self,
        connection_id: ConnectionId,
        region: &Region,
        window: &TimeWindow,
    ) -> AppResult<Vec<PostWithAuthor>> {
        let (from, to) = window
            .bounds()
            .ok_or_else(|| AppError::BadRequest("time window out of range".to_string()))?;

        let posts = post_repo::find_in_region(&self.db, region, from, to).await?;
        metrics::SNAPSHOT_QUERIES.inc();

        let recorded = self
            .registry
            .set_subscription(
                connection_id,
                Subscription {
                    region: *region,
                    time: *window,
                },
            )
            .await;
        if !recorded {
            tracing::debug!(
                connection = %connection_id,
                "connection closed before its subscription was recorded"
            );
        }

        Ok(posts)
    }
}
