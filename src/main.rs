use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use geofeed_backend::middleware::JwtAuthMiddleware;
use geofeed_backend::services::{DispatchService, PhotoStorage};
use geofeed_backend::websocket::SubscriptionRegistry;
use geofeed_backend::{config, db, events::PostEvents, handlers, logging, metrics, state::AppState};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_tracing();

    let cfg = Arc::new(config::Config::from_env().context("loading configuration")?);

    let pool = db::init_pool(&cfg.database_url)
        .await
        .context("connecting to database")?;

    let registry = SubscriptionRegistry::new();
    let (post_events, event_rx) = PostEvents::channel();
    let photos = PhotoStorage::connect(&cfg.s3).await;

    let state = AppState {
        db: pool.clone(),
        registry: registry.clone(),
        events: post_events,
        photos,
        config: cfg.clone(),
    };

    // Live dispatch consumes post-created events for the near-me channel.
    let dispatcher = DispatchService::new(pool, registry);
    tokio::spawn(dispatcher.run(event_rx));

    let bind_addr = format!("0.0.0.0:{}", cfg.port);
    tracing::info!(%bind_addr, "starting geofeed-backend");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(TracingLogger::default())
            .wrap(Cors::permissive())
            .route("/health", web::get().to(handlers::health))
            .route("/metrics", web::get().to(metrics::metrics_endpoint))
            .route(
                "/ws",
                web::get().to(geofeed_backend::websocket::nearme_ws),
            )
            .service(
                web::scope("/api")
                    .service(handlers::users::register)
                    .service(handlers::users::login)
                    .service(
                        web::scope("")
                            .wrap(JwtAuthMiddleware)
                            .service(handlers::users::list)
                            .service(handlers::profile::get_my_profile)
                            .service(handlers::profile::update_profile)
                            .service(handlers::profile::upload_profile_photo)
                            .service(handlers::profile::get_profile_posts)
                            .service(handlers::photos::get_photo)
                            .service(handlers::posts::create_post)
                            .service(handlers::posts::posts_by_tag)
                            .service(handlers::posts::get_post)
                            .service(handlers::posts::add_comment)
                            .service(handlers::posts::toggle_like)
                            .service(handlers::feed::get_feed_filtered)
                            .service(handlers::feed::get_feed)
                            .service(handlers::search::search_people)
                            .service(handlers::connections::request_connection)
                            .service(handlers::connections::accept_connection)
                            .service(handlers::connections::get_connections),
                    ),
            )
    })
    .bind(&bind_addr)
    .with_context(|| format!("binding {bind_addr}"))?
    .run()
    .await
    .context("running HTTP server")?;

    Ok(())
}
