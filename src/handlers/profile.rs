use crate::db::{post_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::handlers::decode_photo;
use crate::middleware::UserId;
use crate::services::photo_storage::PROFILE_PHOTO_PREFIX;
use crate::state::AppState;
use actix_web::{get, post, put, web, HttpResponse};
use serde::Deserialize;

#[get("/profile")]
pub async fn get_my_profile(state: web::Data<AppState>, caller: UserId) -> AppResult<HttpResponse> {
    let profile = user_repo::profile(&state.db, caller.0)
        .await?
        .ok_or_else(|| AppError::NotFound("User with the given ID does not exist!".to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": profile })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub fullname: Option<String>,
    pub about: Option<String>,
    pub contact_telegram: Option<String>,
    pub contact_messenger: Option<String>,
    pub contact_whatsapp: Option<String>,
    pub newsletter: Option<bool>,
}

#[put("/profile")]
pub async fn update_profile(
    state: web::Data<AppState>,
    caller: UserId,
    req: web::Json<UpdateProfileRequest>,
) -> AppResult<HttpResponse> {
    let req = req.into_inner();

    user_repo::update_profile(
        &state.db,
        caller.0,
        user_repo::ProfileUpdate {
            fullname: req.fullname.as_deref(),
            about: req.about.as_deref(),
            contact_telegram: req.contact_telegram.as_deref(),
            contact_messenger: req.contact_messenger.as_deref(),
            contact_whatsapp: req.contact_whatsapp.as_deref(),
            newsletter: req.newsletter,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Your information has been updated!",
    })))
}

#[derive(Debug, Deserialize)]
pub struct UploadPhotoRequest {
    pub photo: String,
}

#[post("/profile/photo")]
pub async fn upload_profile_photo(
    state: web::Data<AppState>,
    caller: UserId,
    req: web::Json<UploadPhotoRequest>,
) -> AppResult<HttpResponse> {
    let bytes = decode_photo(&req.photo)?;

    let photo_key = state
        .photos
        .store(PROFILE_PHOTO_PREFIX, bytes, "image/jpeg")
        .await?;

    user_repo::set_profile_photo(&state.db, caller.0, &photo_key).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "data": {
            "message": "Your new profile photo has been set!",
            "photo_key": photo_key,
        },
    })))
}

#[get("/profile/{user_id}/posts")]
pub async fn get_profile_posts(
    state: web::Data<AppState>,
    caller: UserId,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();

    if !user_repo::exists(&state.db, user_id).await? {
        return Err(AppError::NotFound(
            "User with the given ID does not exist!".to_string(),
        ));
    }

    let posts = post_repo::posts_by_user(&state.db, caller.0, user_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": posts })))
}
