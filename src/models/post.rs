use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

/// Post author fields joined into post payloads.
#[derive(Debug, Clone, Serialize)]
pub struct PostAuthor {
    pub fullname: String,
    pub profile_photo: Option<String>,
}

/// A post together with its author, photo keys and tags.
///
/// This is the payload shape carried by the near-me channel ("posts" and
/// "new post" messages) and reused by profile listings.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithAuthor {
    pub id: i32,
    pub description: String,
    pub is_public: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub views: i32,
    pub created_at: DateTime<Utc>,
    pub user: PostAuthor,
    pub photos: Vec<String>,
    pub tags: Vec<String>,
}

impl<'r> FromRow<'r, PgRow> for PostWithAuthor {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            description: row.try_get("description")?,
            is_public: row.try_get("is_public")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            views: row.try_get("views")?,
            created_at: row.try_get("created_at")?,
            user: PostAuthor {
                fullname: row.try_get("fullname")?,
                profile_photo: row.try_get("profile_photo")?,
            },
            photos: row.try_get("photos")?,
            tags: row.try_get("tags")?,
        })
    }
}

/// A comment with its author's display fields.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: i32,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub user_id: i32,
    pub fullname: String,
}

/// Feed entry: a post with engagement counts and the caller's like state.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: PostWithAuthor,
    pub comment_count: i64,
    pub like_count: i64,
    pub liked: bool,
}

impl<'r> FromRow<'r, PgRow> for FeedPost {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            post: PostWithAuthor::from_row(row)?,
            comment_count: row.try_get("comment_count")?,
            like_count: row.try_get("like_count")?,
            liked: row.try_get("liked")?,
        })
    }
}

/// Full post detail for `GET /api/post/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: FeedPost,
    pub comments: Vec<Comment>,
}
