use crate::models::PublicUser;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};

#[derive(Debug, Clone, FromRow)]
pub struct ConnectionRow {
    pub id: i32,
    pub user1_id: i32,
    pub user2_id: i32,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

/// An accepted connection presented from one side: the counterpart user.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionEntry {
    pub id: i32,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub user: PublicUser,
}

impl<'r> FromRow<'r, PgRow> for ConnectionEntry {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            created_at: row.try_get("created_at")?,
            accepted_at: row.try_get("accepted_at")?,
            user: PublicUser {
                id: row.try_get("user_id")?,
                fullname: row.try_get("fullname")?,
                username: row.try_get("username")?,
                profile_photo: row.try_get("profile_photo")?,
            },
        })
    }
}

/// The request `from_id` sent to `to_id`, if any. Direction matters: a
/// request and its mirror image are distinct rows.
pub async fn find_request(
    pool: &PgPool,
    from_id: i32,
    to_id: i32,
) -> Result<Option<ConnectionRow>, sqlx::Error> {
    sqlx::query_as::<_, ConnectionRow>(
        r#"
        SELECT id, user1_id, user2_id, accepted, created_at, accepted_at
        FROM connections
        WHERE user1_id = $1 AND user2_id = $2
        "#,
    )
    .bind(from_id)
    .bind(to_id)
    .fetch_optional(pool)
    .await
}

pub async fn create_request(pool: &PgPool, from_id: i32, to_id: i32) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO connections (user1_id, user2_id) VALUES ($1, $2)")
        .bind(from_id)
        .bind(to_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn accept(pool: &PgPool, connection_id: i32) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE connections SET accepted = TRUE, accepted_at = NOW() WHERE id = $1")
        .bind(connection_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Accepted connections of a user, from either side, presenting the
/// counterpart.
pub async fn list_accepted(
    pool: &PgPool,
    user_id: i32,
) -> Result<Vec<ConnectionEntry>, sqlx::Error> {
    sqlx::query_as::<_, ConnectionEntry>(
        r#"
        SELECT c.id, c.created_at, c.accepted_at,
               u.id AS user_id, u.fullname, u.username, u.profile_photo
        FROM connections c
        JOIN users u
          ON u.id = CASE WHEN c.user1_id = $1 THEN c.user2_id ELSE c.user1_id END
        WHERE c.accepted = TRUE AND (c.user1_id = $1 OR c.user2_id = $1)
        ORDER BY c.accepted_at DESC NULLS LAST, c.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
