//! Wire format of the near-me channel. Frames are JSON objects tagged by a
//! `type` field; field names match what the mobile client already sends.

use crate::models::{GeoPoint, PostWithAuthor, TimeWindow};
use serde::{Deserialize, Serialize};

/// Inbound frames (client to server).
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// The client is now viewing a map region and wants everything in it.
    #[serde(rename = "fetch near me", rename_all = "camelCase")]
    FetchNearMe {
        location_from: GeoPoint,
        location_to: GeoPoint,
        time: TimeWindow,
    },
}

/// Outbound frames (server to client).
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Bulk reply to one "fetch near me" request.
    #[serde(rename = "posts")]
    Posts { posts: Vec<PostWithAuthor> },

    /// A post created while the client's viewport contains it.
    #[serde(rename = "new post")]
    NewPost { post: PostWithAuthor },

    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMessage {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostAuthor;
    use chrono::TimeZone;

    #[test]
    fn fetch_near_me_parses_the_documented_shape() {
        let raw = r#"{
            "type": "fetch near me",
            "locationFrom": {"latitude": 0.0, "longitude": 20.0},
            "locationTo": {"latitude": 20.0, "longitude": 10.0},
            "time": {"from": 1000, "to": 2000}
        }"#;

        let ClientMessage::FetchNearMe {
            location_from,
            location_to,
            time,
        } = serde_json::from_str(raw).unwrap();

        assert_eq!(location_from.longitude, 20.0);
        assert_eq!(location_to.latitude, 20.0);
        assert_eq!(time, TimeWindow { from: 1000, to: 2000 });
    }

    #[test]
    fn non_numeric_region_fields_are_rejected() {
        let raw = r#"{
            "type": "fetch near me",
            "locationFrom": {"latitude": "zero", "longitude": 20.0},
            "locationTo": {"latitude": 20.0, "longitude": 10.0},
            "time": {"from": 1000, "to": 2000}
        }"#;

        assert!(serde_json::from_str::<ClientMessage>(raw).is_err());
    }

    #[test]
    fn missing_time_window_is_rejected() {
        let raw = r#"{
            "type": "fetch near me",
            "locationFrom": {"latitude": 0.0, "longitude": 20.0},
            "locationTo": {"latitude": 20.0, "longitude": 10.0}
        }"#;

        assert!(serde_json::from_str::<ClientMessage>(raw).is_err());
    }

    #[test]
    fn new_post_frame_carries_the_post_payload() {
        let post = PostWithAuthor {
            id: 7,
            description: "sunset at the pier".to_string(),
            is_public: true,
            latitude: 5.0,
            longitude: 15.0,
            views: 0,
            created_at: chrono::Utc.timestamp_opt(1500, 0).unwrap(),
            user: PostAuthor {
                fullname: "Ada Lovelace".to_string(),
                profile_photo: Some("profile-photos/abc".to_string()),
            },
            photos: vec!["post-photos/xyz".to_string()],
            tags: vec!["sunset".to_string()],
        };

        let json = ServerMessage::NewPost { post }.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "new post");
        assert_eq!(value["post"]["id"], 7);
        assert_eq!(value["post"]["user"]["fullname"], "Ada Lovelace");
        assert_eq!(value["post"]["photos"][0], "post-photos/xyz");
    }

    #[test]
    fn posts_frame_is_tagged_posts() {
        let json = ServerMessage::Posts { posts: vec![] }.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "posts");
        assert!(value["posts"].as_array().unwrap().is_empty());
    }
}
