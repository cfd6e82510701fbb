use crate::db::user_repo;
use crate::error::{AppError, AppResult};
use crate::middleware::UserId;
use crate::state::AppState;
use actix_web::{post, web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

#[post("/search/people")]
pub async fn search_people(
    state: web::Data<AppState>,
    _caller: UserId,
    req: web::Json<SearchRequest>,
) -> AppResult<HttpResponse> {
    let people = user_repo::search(&state.db, &req.query).await?;

    if people.is_empty() {
        return Err(AppError::NotFound(
            "No people match the given search query!".to_string(),
        ));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": people })))
}
