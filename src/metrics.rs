use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_gauge, Encoder, IntCounter, IntGauge, TextEncoder,
};

pub static WS_CONNECTIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "geofeed_ws_connections",
        "Currently open near-me channel connections"
    )
    .expect("register geofeed_ws_connections")
});

pub static SNAPSHOT_QUERIES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "geofeed_snapshot_queries_total",
        "Near-me snapshot queries served"
    )
    .expect("register geofeed_snapshot_queries_total")
});

pub static DISPATCHED_POSTS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "geofeed_dispatched_posts_total",
        "Post-created events processed by live dispatch"
    )
    .expect("register geofeed_dispatched_posts_total")
});

pub static DISPATCH_DELIVERIES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "geofeed_dispatch_deliveries_total",
        "New-post messages delivered to subscribed connections"
    )
    .expect("register geofeed_dispatch_deliveries_total")
});

pub static DISPATCH_SEND_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "geofeed_dispatch_send_failures_total",
        "Fan-out sends that found the connection gone"
    )
    .expect("register geofeed_dispatch_send_failures_total")
});

pub async fn metrics_endpoint() -> HttpResponse {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}
