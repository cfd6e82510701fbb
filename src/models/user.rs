use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Full user row. The password hash never leaves the process.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub fullname: String,
    pub password: String,
    pub profile_photo: Option<String>,
    pub about: Option<String>,
    pub contact_telegram: Option<String>,
    pub contact_messenger: Option<String>,
    pub contact_whatsapp: Option<String>,
    pub premium: bool,
    pub newsletter: bool,
    pub created_at: DateTime<Utc>,
}

/// Display fields safe to return to any authenticated caller.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PublicUser {
    pub id: i32,
    pub fullname: String,
    pub username: String,
    pub profile_photo: Option<String>,
}

/// The caller's own profile.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub id: i32,
    pub fullname: String,
    pub username: String,
    pub email: String,
    pub profile_photo: Option<String>,
    pub about: Option<String>,
    pub contact_telegram: Option<String>,
    pub contact_messenger: Option<String>,
    pub contact_whatsapp: Option<String>,
}
