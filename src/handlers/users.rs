use crate::db::user_repo::{self, NewUser};
use crate::error::{AppError, AppResult};
use crate::middleware::{issue_token, UserId};
use crate::state::AppState;
use actix_web::{get, post, web, HttpResponse};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};

fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing failed");
            AppError::Internal
        })
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub fullname: String,
    pub password: String,
    #[serde(default)]
    pub premium: bool,
    #[serde(default)]
    pub newsletter: bool,
}

#[post("/user/register")]
pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = req.into_inner();

    if req.email.is_empty() || req.username.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "email, username and password are required".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;

    let result = user_repo::create(
        &state.db,
        NewUser {
            email: &req.email,
            username: &req.username,
            fullname: &req.fullname,
            password_hash: &password_hash,
            premium: req.premium,
            newsletter: req.newsletter,
        },
    )
    .await;

    match result {
        Ok(user) => {
            tracing::info!(user_id = user.id, "user registered");
            Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
        }
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(AppError::Conflict(
            "email or username already taken".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct LoginUser {
    token: String,
    email: String,
    username: String,
    fullname: String,
    premium: bool,
    newsletter: bool,
}

#[post("/user/login")]
pub async fn login(
    state: web::Data<AppState>,
    req: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = req.into_inner();

    let user = user_repo::find_by_email(&state.db, &req.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&req.password, &user.password) {
        return Err(AppError::Unauthorized);
    }

    let token = issue_token(&user, &state.config.jwt_secret, state.config.token_ttl_hours)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": LoginUser {
            token,
            email: user.email,
            username: user.username,
            fullname: user.fullname,
            premium: user.premium,
            newsletter: user.newsletter,
        },
    })))
}

#[get("/user")]
pub async fn list(state: web::Data<AppState>, _caller: UserId) -> AppResult<HttpResponse> {
    let users = user_repo::list(&state.db).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": users })))
}
