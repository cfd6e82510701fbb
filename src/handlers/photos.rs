use crate::error::AppResult;
use crate::middleware::UserId;
use crate::state::AppState;
use actix_web::{get, web, HttpResponse};

/// Serve stored photo bytes by their opaque key. Keys contain a prefix
/// segment, so the tail of the path is matched as one parameter.
#[get("/photo/{key:.*}")]
pub async fn get_photo(
    state: web::Data<AppState>,
    _caller: UserId,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let key = path.into_inner();
    let bytes = state.photos.fetch(&key).await?;

    Ok(HttpResponse::Ok().content_type("image/jpeg").body(bytes))
}
