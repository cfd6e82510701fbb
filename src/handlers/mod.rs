use crate::error::{AppError, AppResult};
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

pub mod connections;
pub mod feed;
pub mod photos;
pub mod posts;
pub mod profile;
pub mod search;
pub mod users;

/// Decode a client-supplied photo, tolerating a data-URL prefix.
pub(crate) fn decode_photo(payload: &str) -> AppResult<Vec<u8>> {
    let data = payload
        .split_once("base64,")
        .map(|(_, rest)| rest)
        .unwrap_or(payload);

    STANDARD
        .decode(data.trim())
        .map_err(|e| AppError::BadRequest(format!("invalid photo encoding: {e}")))
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match sqlx::query("SELECT 1").fetch_one(&state.db).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("database connection failed: {e}"),
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::decode_photo;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    #[test]
    fn decodes_plain_base64() {
        let encoded = STANDARD.encode(b"raw bytes");
        assert_eq!(decode_photo(&encoded).unwrap(), b"raw bytes");
    }

    #[test]
    fn strips_a_data_url_prefix() {
        let encoded = format!("data:image/jpeg;base64,{}", STANDARD.encode(b"jpeg data"));
        assert_eq!(decode_photo(&encoded).unwrap(), b"jpeg data");
    }

    #[test]
    fn rejects_invalid_input() {
        assert!(decode_photo("!!! not base64 !!!").is_err());
    }
}
