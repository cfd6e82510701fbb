//! End-to-end exercises of the near-me channel state machine: a client's
//! "fetch near me" request recorded as a subscription, followed by live
//! fan-out of newly created posts. The database-backed snapshot query is
//! covered separately; here posts arrive pre-loaded.

use chrono::TimeZone;
use geofeed_backend::models::{PostAuthor, PostWithAuthor, Region, Subscription, TimeWindow};
use geofeed_backend::services::dispatch::fan_out;
use geofeed_backend::websocket::{ClientMessage, SubscriptionRegistry};
use tokio::sync::mpsc::error::TryRecvError;

fn post_at(id: i32, latitude: f64, longitude: f64, created_at_unix: i64) -> PostWithAuthor {
    PostWithAuthor {
        id,
        description: "from the map".to_string(),
        is_public: true,
        latitude,
        longitude,
        views: 0,
        created_at: chrono::Utc.timestamp_opt(created_at_unix, 0).unwrap(),
        user: PostAuthor {
            fullname: "Grace Hopper".to_string(),
            profile_photo: None,
        },
        photos: vec![],
        tags: vec![],
    }
}

/// Parse the wire frame a client would send and turn it into a subscription,
/// the way the session handler does.
fn subscription_from_frame(raw: &str) -> Subscription {
    let ClientMessage::FetchNearMe {
        location_from,
        location_to,
        time,
    } = serde_json::from_str(raw).unwrap();

    Subscription {
        region: Region {
            location_from,
            location_to,
        },
        time,
    }
}

#[tokio::test]
async fn subscribed_viewport_receives_matching_posts_only() {
    let registry = SubscriptionRegistry::new();
    let (id, mut rx) = registry.connect().await;

    // Longitude 20 down to 10, latitude 0 up to 20.
    let sub = subscription_from_frame(
        r#"{
            "type": "fetch near me",
            "locationFrom": {"latitude": 0.0, "longitude": 20.0},
            "locationTo": {"latitude": 20.0, "longitude": 10.0},
            "time": {"from": 1000, "to": 2000}
        }"#,
    );
    assert!(registry.set_subscription(id, sub).await);

    // Inside the rectangle.
    let delivered = fan_out(&registry, &post_at(1, 5.0, 15.0, 1500))
        .await
        .unwrap();
    assert_eq!(delivered, 1);

    let frame = rx.try_recv().unwrap();
    let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(value["type"], "new post");
    assert_eq!(value["post"]["id"], 1);

    // Same latitude, longitude outside the rectangle.
    let delivered = fan_out(&registry, &post_at(2, 5.0, 25.0, 1500))
        .await
        .unwrap();
    assert_eq!(delivered, 0);
    assert_eq!(rx.try_recv().unwrap_err(), TryRecvError::Empty);
}

#[tokio::test]
async fn two_viewports_are_matched_independently() {
    let registry = SubscriptionRegistry::new();

    let (id_a, mut rx_a) = registry.connect().await;
    registry
        .set_subscription(
            id_a,
            subscription_from_frame(
                r#"{
                    "type": "fetch near me",
                    "locationFrom": {"latitude": 0.0, "longitude": 20.0},
                    "locationTo": {"latitude": 20.0, "longitude": 10.0},
                    "time": {"from": 1000, "to": 2000}
                }"#,
            ),
        )
        .await;

    let (id_b, mut rx_b) = registry.connect().await;
    registry
        .set_subscription(
            id_b,
            subscription_from_frame(
                r#"{
                    "type": "fetch near me",
                    "locationFrom": {"latitude": -60.0, "longitude": -100.0},
                    "locationTo": {"latitude": -40.0, "longitude": -120.0},
                    "time": {"from": 1000, "to": 2000}
                }"#,
            ),
        )
        .await;

    let delivered = fan_out(&registry, &post_at(3, 5.0, 15.0, 1500))
        .await
        .unwrap();

    assert_eq!(delivered, 1);
    assert!(rx_a.try_recv().is_ok());
    assert_eq!(rx_b.try_recv().unwrap_err(), TryRecvError::Empty);
}

#[tokio::test]
async fn a_replaced_viewport_stops_matching_the_old_one() {
    let registry = SubscriptionRegistry::new();
    let (id, mut rx) = registry.connect().await;

    registry
        .set_subscription(
            id,
            subscription_from_frame(
                r#"{
                    "type": "fetch near me",
                    "locationFrom": {"latitude": 0.0, "longitude": 20.0},
                    "locationTo": {"latitude": 20.0, "longitude": 10.0},
                    "time": {"from": 1000, "to": 2000}
                }"#,
            ),
        )
        .await;

    // The client pans the map elsewhere.
    registry
        .set_subscription(
            id,
            subscription_from_frame(
                r#"{
                    "type": "fetch near me",
                    "locationFrom": {"latitude": 40.0, "longitude": 60.0},
                    "locationTo": {"latitude": 60.0, "longitude": 50.0},
                    "time": {"from": 1000, "to": 2000}
                }"#,
            ),
        )
        .await;

    let delivered = fan_out(&registry, &post_at(4, 5.0, 15.0, 1500))
        .await
        .unwrap();
    assert_eq!(delivered, 0);

    let delivered = fan_out(&registry, &post_at(5, 50.0, 55.0, 1500))
        .await
        .unwrap();
    assert_eq!(delivered, 1);
    let frame = rx.try_recv().unwrap();
    assert!(frame.contains("\"new post\""));
}

#[tokio::test]
async fn posts_after_disconnect_reach_nobody() {
    let registry = SubscriptionRegistry::new();
    let (id, _rx) = registry.connect().await;

    registry
        .set_subscription(
            id,
            subscription_from_frame(
                r#"{
                    "type": "fetch near me",
                    "locationFrom": {"latitude": 0.0, "longitude": 20.0},
                    "locationTo": {"latitude": 20.0, "longitude": 10.0},
                    "time": {"from": 1000, "to": 2000}
                }"#,
            ),
        )
        .await;

    registry.disconnect(id).await;

    let delivered = fan_out(&registry, &post_at(6, 5.0, 15.0, 1500))
        .await
        .unwrap();

    assert_eq!(delivered, 0);
    assert!(registry.subscriptions().await.is_empty());
}
