use crate::db::post_repo::{self, NewPost};
use crate::error::{AppError, AppResult};
use crate::events::PostEvent;
use crate::handlers::decode_photo;
use crate::middleware::UserId;
use crate::models::{GeoPoint, PostDetail};
use crate::services::photo_storage::POST_PHOTO_PREFIX;
use crate::state::AppState;
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub description: String,
    pub is_public: bool,
    pub latitude: f64,
    pub longitude: f64,
    /// Base64-encoded photos, stored before the post row is written.
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[post("/post")]
pub async fn create_post(
    state: web::Data<AppState>,
    caller: UserId,
    req: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = req.into_inner();

    GeoPoint::new(req.latitude, req.longitude).map_err(AppError::BadRequest)?;

    let mut photo_keys = Vec::with_capacity(req.photos.len());
    for photo in &req.photos {
        let bytes = decode_photo(photo)?;
        let key = state
            .photos
            .store(POST_PHOTO_PREFIX, bytes, "image/jpeg")
            .await?;
        photo_keys.push(key);
    }

    let post_id = post_repo::create_post(
        &state.db,
        NewPost {
            user_id: caller.0,
            description: &req.description,
            is_public: req.is_public,
            latitude: req.latitude,
            longitude: req.longitude,
            photo_keys,
            tags: req.tags,
        },
    )
    .await?;

    tracing::info!(post_id, user_id = caller.0, "post created");

    // Hand the post to the near-me channel; delivery happens off this request.
    state.events.publish(PostEvent::Created { post_id });

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Post successfully created!",
        "data": { "post_id": post_id },
    })))
}

#[derive(Debug, Deserialize)]
pub struct ByTagQuery {
    pub query: String,
    pub number: i64,
    #[serde(rename = "lastPostId")]
    pub last_post_id: Option<i32>,
}

#[get("/post/by-tag")]
pub async fn posts_by_tag(
    state: web::Data<AppState>,
    caller: UserId,
    query: web::Query<ByTagQuery>,
) -> AppResult<HttpResponse> {
    let q = query.into_inner();
    let limit = q.number.clamp(1, 100);

    let posts = post_repo::find_by_tag(&state.db, caller.0, &q.query, limit, q.last_post_id).await?;

    if posts.is_empty() {
        return Err(AppError::NotFound(
            "No posts match the given search query!".to_string(),
        ));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": posts })))
}

#[get("/post/{post_id}")]
pub async fn get_post(
    state: web::Data<AppState>,
    caller: UserId,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    let post = post_repo::find_detail(&state.db, caller.0, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post with the given ID does not exist!".to_string()))?;

    let comments = post_repo::comments_for_post(&state.db, post_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": PostDetail { post, comments },
    })))
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub text: String,
}

#[post("/post/{post_id}/comment")]
pub async fn add_comment(
    state: web::Data<AppState>,
    caller: UserId,
    path: web::Path<i32>,
    req: web::Json<AddCommentRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let req = req.into_inner();

    if req.text.trim().is_empty() {
        return Err(AppError::BadRequest("comment text is required".to_string()));
    }

    if !post_repo::exists(&state.db, post_id).await? {
        return Err(AppError::NotFound(
            "Post with the given ID does not exist!".to_string(),
        ));
    }

    post_repo::add_comment(&state.db, post_id, caller.0, req.text.trim()).await?;
    let comments = post_repo::comments_for_post(&state.db, post_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Comment added!",
        "data": { "comments": comments },
    })))
}

#[post("/post/{post_id}/toggle-like")]
pub async fn toggle_like(
    state: web::Data<AppState>,
    caller: UserId,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    if !post_repo::exists(&state.db, post_id).await? {
        return Err(AppError::NotFound(
            "Post with the given ID does not exist!".to_string(),
        ));
    }

    let liked = post_repo::toggle_like(&state.db, post_id, caller.0).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Post like status has successfully been toggled!",
        "data": { "post_id": post_id, "liked": liked },
    })))
}
