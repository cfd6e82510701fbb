//! Opaque key/value photo storage backed by S3.
//!
//! Callers hand over bytes and get back a storage key; nothing else about
//! the storage layer leaks out.

use crate::config::S3Config;
use crate::error::{AppError, AppResult};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use uuid::Uuid;

pub const PROFILE_PHOTO_PREFIX: &str = "profile-photos";
pub const POST_PHOTO_PREFIX: &str = "post-photos";

#[derive(Clone)]
pub struct PhotoStorage {
    client: Client,
    bucket: String,
}

impl PhotoStorage {
    pub async fn connect(cfg: &S3Config) -> Self {
        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(cfg.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &cfg.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: cfg.bucket.clone(),
        }
    }

    /// Store bytes under a fresh key beneath the prefix and return the key.
    pub async fn store(&self, prefix: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String> {
        let key = format!("{prefix}/{}", Uuid::new_v4());

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(key)
    }

    pub async fn fetch(&self, key: &str) -> AppResult<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(e.to_string()))?;

        Ok(body.into_bytes().to_vec())
    }
}
