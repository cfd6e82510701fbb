use crate::error::AppError;
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Lifetime of issued access tokens, in hours.
    pub token_ttl_hours: i64,
    pub s3: S3Config,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Config("DATABASE_URL must be set".to_string()))?;

        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("invalid PORT: {e}")))?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::Config("JWT_SECRET must be set".to_string()))?;
        if jwt_secret.len() < 16 {
            return Err(AppError::Config(
                "JWT_SECRET must be at least 16 bytes".to_string(),
            ));
        }

        let token_ttl_hours = env::var("TOKEN_TTL_HOURS")
            .unwrap_or_else(|_| "720".to_string())
            .parse::<i64>()
            .map_err(|e| AppError::Config(format!("invalid TOKEN_TTL_HOURS: {e}")))?;

        let s3 = S3Config {
            bucket: env::var("S3_BUCKET").unwrap_or_else(|_| "geofeed-photos".to_string()),
            region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            endpoint: env::var("S3_ENDPOINT").ok(),
        };

        Ok(Self {
            database_url,
            port,
            jwt_secret,
            token_ttl_hours,
            s3,
        })
    }
}
