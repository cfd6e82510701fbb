use crate::models::{Comment, FeedPost, PostWithAuthor, Region};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct NewPost<'a> {
    pub user_id: i32,
    pub description: &'a str,
    pub is_public: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub photo_keys: Vec<String>,
    pub tags: Vec<String>,
}

/// Insert a post with its photo keys and tags, returning the new id.
pub async fn create_post(pool: &PgPool, new: NewPost<'_>) -> Result<i32, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let (post_id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO posts (user_id, description, is_public, latitude, longitude)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(new.user_id)
    .bind(new.description)
    .bind(new.is_public)
    .bind(new.latitude)
    .bind(new.longitude)
    .fetch_one(&mut *tx)
    .await?;

    for key in &new.photo_keys {
        sqlx::query("INSERT INTO post_photos (post_id, photo_key) VALUES ($1, $2)")
            .bind(post_id)
            .bind(key)
            .execute(&mut *tx)
            .await?;
    }

    for tag in &new.tags {
        sqlx::query("INSERT INTO post_tags (post_id, tag) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(post_id)
            .bind(tag)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(post_id)
}

/// All public posts inside a region whose creation instant falls inside the
/// window, bounds inclusive on every axis. Unbounded by design: the caller's
/// viewport is expected to be small.
pub async fn find_in_region(
    pool: &PgPool,
    region: &Region,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<PostWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, PostWithAuthor>(
        r#"
        SELECT p.id, p.description, p.is_public, p.latitude, p.longitude, p.views, p.created_at,
               u.fullname, u.profile_photo,
               COALESCE((SELECT array_agg(ph.photo_key ORDER BY ph.id)
                         FROM post_photos ph WHERE ph.post_id = p.id), '{}') AS photos,
               COALESCE((SELECT array_agg(t.tag ORDER BY t.tag)
                         FROM post_tags t WHERE t.post_id = p.id), '{}') AS tags
        FROM posts p
        JOIN users u ON u.id = p.user_id
        WHERE p.is_public = TRUE
          AND p.longitude BETWEEN $1 AND $2
          AND p.latitude BETWEEN $3 AND $4
          AND p.created_at BETWEEN $5 AND $6
        ORDER BY p.created_at DESC
        "#,
    )
    .bind(region.longitude_min())
    .bind(region.longitude_max())
    .bind(region.latitude_min())
    .bind(region.latitude_max())
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await
}

/// Load one post with its author, or `None` when it no longer exists.
pub async fn find_with_author(
    pool: &PgPool,
    post_id: i32,
) -> Result<Option<PostWithAuthor>, sqlx::Error> {
    sqlx::query_as::<_, PostWithAuthor>(
        r#"
        SELECT p.id, p.description, p.is_public, p.latitude, p.longitude, p.views, p.created_at,
               u.fullname, u.profile_photo,
               COALESCE((SELECT array_agg(ph.photo_key ORDER BY ph.id)
                         FROM post_photos ph WHERE ph.post_id = p.id), '{}') AS photos,
               COALESCE((SELECT array_agg(t.tag ORDER BY t.tag)
                         FROM post_tags t WHERE t.post_id = p.id), '{}') AS tags
        FROM posts p
        JOIN users u ON u.id = p.user_id
        WHERE p.id = $1
        "#,
    )
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

/// One page of the public feed, newest first. When `last_post_id` is given,
/// the page starts strictly after that post's position.
pub async fn feed_page(
    pool: &PgPool,
    viewer_id: i32,
    limit: i64,
    last_post_id: Option<i32>,
) -> Result<Vec<FeedPost>, sqlx::Error> {
    sqlx::query_as::<_, FeedPost>(
        r#"
        SELECT p.id, p.description, p.is_public, p.latitude, p.longitude, p.views, p.created_at,
               u.fullname, u.profile_photo,
               COALESCE((SELECT array_agg(ph.photo_key ORDER BY ph.id)
                         FROM post_photos ph WHERE ph.post_id = p.id), '{}') AS photos,
               COALESCE((SELECT array_agg(t.tag ORDER BY t.tag)
                         FROM post_tags t WHERE t.post_id = p.id), '{}') AS tags,
               (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
               (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
               EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $1) AS liked
        FROM posts p
        JOIN users u ON u.id = p.user_id
        WHERE p.is_public = TRUE
          AND ($2::int IS NULL OR (p.created_at, p.id) <
               (SELECT c.created_at, c.id FROM posts c WHERE c.id = $2))
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT $3
        "#,
    )
    .bind(viewer_id)
    .bind(last_post_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Feed page restricted to posts whose description or author name contains
/// the filter, case-insensitively.
pub async fn feed_page_filtered(
    pool: &PgPool,
    viewer_id: i32,
    limit: i64,
    last_post_id: Option<i32>,
    filter: &str,
) -> Result<Vec<FeedPost>, sqlx::Error> {
    sqlx::query_as::<_, FeedPost>(
        r#"
        SELECT p.id, p.description, p.is_public, p.latitude, p.longitude, p.views, p.created_at,
               u.fullname, u.profile_photo,
               COALESCE((SELECT array_agg(ph.photo_key ORDER BY ph.id)
                         FROM post_photos ph WHERE ph.post_id = p.id), '{}') AS photos,
               COALESCE((SELECT array_agg(t.tag ORDER BY t.tag)
                         FROM post_tags t WHERE t.post_id = p.id), '{}') AS tags,
               (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
               (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
               EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $1) AS liked
        FROM posts p
        JOIN users u ON u.id = p.user_id
        WHERE p.is_public = TRUE
          AND (p.description ILIKE '%' || $4 || '%' OR u.fullname ILIKE '%' || $4 || '%')
          AND ($2::int IS NULL OR (p.created_at, p.id) <
               (SELECT c.created_at, c.id FROM posts c WHERE c.id = $2))
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT $3
        "#,
    )
    .bind(viewer_id)
    .bind(last_post_id)
    .bind(limit)
    .bind(filter)
    .fetch_all(pool)
    .await
}

/// Posts carrying a tag, newest first, keyset-paginated like the feed.
pub async fn find_by_tag(
    pool: &PgPool,
    viewer_id: i32,
    tag: &str,
    limit: i64,
    last_post_id: Option<i32>,
) -> Result<Vec<FeedPost>, sqlx::Error> {
    sqlx::query_as::<_, FeedPost>(
        r#"
        SELECT p.id, p.description, p.is_public, p.latitude, p.longitude, p.views, p.created_at,
               u.fullname, u.profile_photo,
               COALESCE((SELECT array_agg(ph.photo_key ORDER BY ph.id)
                         FROM post_photos ph WHERE ph.post_id = p.id), '{}') AS photos,
               COALESCE((SELECT array_agg(t.tag ORDER BY t.tag)
                         FROM post_tags t WHERE t.post_id = p.id), '{}') AS tags,
               (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
               (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
               EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $1) AS liked
        FROM posts p
        JOIN users u ON u.id = p.user_id
        WHERE p.is_public = TRUE
          AND EXISTS(SELECT 1 FROM post_tags t WHERE t.post_id = p.id AND t.tag = $4)
          AND ($2::int IS NULL OR (p.created_at, p.id) <
               (SELECT c.created_at, c.id FROM posts c WHERE c.id = $2))
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT $3
        "#,
    )
    .bind(viewer_id)
    .bind(last_post_id)
    .bind(limit)
    .bind(tag)
    .fetch_all(pool)
    .await
}

/// A user's posts with engagement counts, newest first.
pub async fn posts_by_user(
    pool: &PgPool,
    viewer_id: i32,
    user_id: i32,
) -> Result<Vec<FeedPost>, sqlx::Error> {
    sqlx::query_as::<_, FeedPost>(
        r#"
        SELECT p.id, p.description, p.is_public, p.latitude, p.longitude, p.views, p.created_at,
               u.fullname, u.profile_photo,
               COALESCE((SELECT array_agg(ph.photo_key ORDER BY ph.id)
                         FROM post_photos ph WHERE ph.post_id = p.id), '{}') AS photos,
               COALESCE((SELECT array_agg(t.tag ORDER BY t.tag)
                         FROM post_tags t WHERE t.post_id = p.id), '{}') AS tags,
               (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
               (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
               EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $1) AS liked
        FROM posts p
        JOIN users u ON u.id = p.user_id
        WHERE p.user_id = $2
        ORDER BY p.created_at DESC, p.id DESC
        "#,
    )
    .bind(viewer_id)
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Detail row for one post, bumping its view counter.
pub async fn find_detail(
    pool: &PgPool,
    viewer_id: i32,
    post_id: i32,
) -> Result<Option<FeedPost>, sqlx::Error> {
    sqlx::query("UPDATE posts SET views = views + 1 WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    sqlx::query_as::<_, FeedPost>(
        r#"
        SELECT p.id, p.description, p.is_public, p.latitude, p.longitude, p.views, p.created_at,
               u.fullname, u.profile_photo,
               COALESCE((SELECT array_agg(ph.photo_key ORDER BY ph.id)
                         FROM post_photos ph WHERE ph.post_id = p.id), '{}') AS photos,
               COALESCE((SELECT array_agg(t.tag ORDER BY t.tag)
                         FROM post_tags t WHERE t.post_id = p.id), '{}') AS tags,
               (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
               (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
               EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $1) AS liked
        FROM posts p
        JOIN users u ON u.id = p.user_id
        WHERE p.id = $2
        "#,
    )
    .bind(viewer_id)
    .bind(post_id)
    .fetch_optional(pool)
    .await
}

pub async fn exists(pool: &PgPool, post_id: i32) -> Result<bool, sqlx::Error> {
    let (found,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
        .bind(post_id)
        .fetch_one(pool)
        .await?;
    Ok(found)
}

pub async fn add_comment(
    pool: &PgPool,
    post_id: i32,
    user_id: i32,
    text: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO comments (post_id, user_id, text) VALUES ($1, $2, $3)")
        .bind(post_id)
        .bind(user_id)
        .bind(text)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn comments_for_post(pool: &PgPool, post_id: i32) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT c.id, c.text, c.created_at, c.user_id, u.fullname
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.post_id = $1
        ORDER BY c.created_at ASC, c.id ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(pool)
    .await
}

/// Like the post if the caller hasn't, unlike otherwise. Returns the new
/// liked state.
pub async fn toggle_like(pool: &PgPool, post_id: i32, user_id: i32) -> Result<bool, sqlx::Error> {
    let removed = sqlx::query("DELETE FROM likes WHERE post_id = $1 AND user_id = $2")
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();

    if removed > 0 {
        return Ok(false);
    }

    sqlx::query(
        "INSERT INTO likes (post_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(post_id)
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(true)
}
