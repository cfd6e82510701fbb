use crate::db::post_repo;
use crate::error::{AppError, AppResult};
use crate::middleware::UserId;
use crate::models::FeedPost;
use crate::state::AppState;
use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub number: i64,
    #[serde(rename = "lastPostId")]
    pub last_post_id: Option<i32>,
    pub filter: Option<String>,
}

fn feed_response(posts: Vec<FeedPost>, prior_cursor: Option<i32>) -> HttpResponse {
    let last_post_id = posts.last().map(|p| p.post.id).or(prior_cursor);

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {
            "posts": posts,
            "lastPostId": last_post_id,
        },
    }))
}

#[get("/feed")]
pub async fn get_feed(
    state: web::Data<AppState>,
    caller: UserId,
    query: web::Query<FeedQuery>,
) -> AppResult<HttpResponse> {
    let q = query.into_inner();
    let limit = q.number.clamp(1, 100);

    let posts = post_repo::feed_page(&state.db, caller.0, limit, q.last_post_id).await?;

    Ok(feed_response(posts, q.last_post_id))
}

#[get("/feed/filtered")]
pub async fn get_feed_filtered(
    state: web::Data<AppState>,
    caller: UserId,
    query: web::Query<FeedQuery>,
) -> AppResult<HttpResponse> {
    let q = query.into_inner();
    let limit = q.number.clamp(1, 100);

    let filter = q
        .filter
        .as_deref()
        .filter(|f| !f.is_empty())
        .ok_or_else(|| {
            AppError::BadRequest(r#"URL parameter "filter" hasn't been provided!"#.to_string())
        })?;

    let posts =
        post_repo::feed_page_filtered(&state.db, caller.0, limit, q.last_post_id, filter).await?;

    Ok(feed_response(posts, q.last_post_id))
}
