//! JWT authentication: token issue/verify helpers, the actix middleware that
//! guards the REST API, and the `UserId` extractor handlers consume.

use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::state::AppState;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::{ErrorInternalServerError, ErrorUnauthorized};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::rc::Rc;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i32,
    pub email: String,
    pub fullname: String,
    pub exp: i64,
}

pub fn issue_token(user: &User, secret: &str, ttl_hours: i64) -> AppResult<String> {
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        fullname: user.fullname.clone(),
        exp: (Utc::now() + Duration::hours(ttl_hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "failed to sign token");
        AppError::Internal
    })
}

pub fn verify_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

/// Authenticated caller, stored in request extensions by the middleware.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub i32);

impl FromRequest for UserId {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<UserId>()
                .copied()
                .ok_or_else(|| ErrorUnauthorized("authentication required")),
        )
    }
}

/// Validates a Bearer token and stores the caller's `UserId` for extraction.
pub struct JwtAuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .cloned()
                .ok_or_else(|| ErrorInternalServerError("application state missing"))?;

            let token = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .ok_or_else(|| ErrorUnauthorized("missing bearer token"))?;

            let claims = verify_token(token, &state.config.jwt_secret)
                .map_err(|_| ErrorUnauthorized("invalid or expired token"))?;

            req.extensions_mut().insert(UserId(claims.sub));

            service.call(req).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_user() -> User {
        User {
            id: 42,
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            fullname: "Ada Lovelace".to_string(),
            password: "hash".to_string(),
            profile_photo: None,
            about: None,
            contact_telegram: None,
            contact_messenger: None,
            contact_whatsapp: None,
            premium: false,
            newsletter: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_round_trips() {
        let secret = "a-test-secret-of-decent-length";
        let token = issue_token(&sample_user(), secret, 1).unwrap();
        let claims = verify_token(&token, secret).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "ada@example.com");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&sample_user(), "a-test-secret-of-decent-length", 1).unwrap();
        assert!(verify_token(&token, "another-secret-entirely!").is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify_token("not.a.token", "a-test-secret-of-decent-length").is_err());
    }
}
