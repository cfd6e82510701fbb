use crate::config::Config;
use crate::events::PostEvents;
use crate::services::photo_storage::PhotoStorage;
use crate::websocket::SubscriptionRegistry;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub registry: SubscriptionRegistry,
    pub events: PostEvents,
    pub photos: PhotoStorage,
    pub config: Arc<Config>,
}
