use crate::db::{connection_repo, user_repo};
use crate::error::{AppError, AppResult};
use crate::middleware::UserId;
use crate::state::AppState;
use actix_web::{get, post, web, HttpResponse};

#[post("/connection/request/{user_id}")]
pub async fn request_connection(
    state: web::Data<AppState>,
    caller: UserId,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let target = path.into_inner();

    if target == caller.0 {
        return Err(AppError::BadRequest(
            "you cannot connect with yourself".to_string(),
        ));
    }

    if !user_repo::exists(&state.db, target).await? {
        return Err(AppError::NotFound(
            "User with the given ID does not exist!".to_string(),
        ));
    }

    if connection_repo::find_request(&state.db, caller.0, target)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "You already sent connection request to this user!".to_string(),
        ));
    }

    connection_repo::create_request(&state.db, caller.0, target).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Connection request sent!",
    })))
}

#[post("/connection/accept/{user_id}")]
pub async fn accept_connection(
    state: web::Data<AppState>,
    caller: UserId,
    path: web::Path<i32>,
) -> AppResult<HttpResponse> {
    let requester = path.into_inner();

    let connection = connection_repo::find_request(&state.db, requester, caller.0)
        .await?
        .ok_or_else(|| AppError::NotFound("Connection request does not exist!".to_string()))?;

    if connection.accepted {
        return Err(AppError::BadRequest(
            "You have already accepted the request!".to_string(),
        ));
    }

    connection_repo::accept(&state.db, connection.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "You are now connected!",
    })))
}

#[get("/connection")]
pub async fn get_connections(
    state: web::Data<AppState>,
    caller: UserId,
) -> AppResult<HttpResponse> {
    let connections = connection_repo::list_accepted(&state.db, caller.0).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": connections })))
}
