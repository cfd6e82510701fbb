use crate::models::{Profile, PublicUser, User};
use sqlx::PgPool;

pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub fullname: &'a str,
    pub password_hash: &'a str,
    pub premium: bool,
    pub newsletter: bool,
}

pub async fn create(pool: &PgPool, new: NewUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, username, fullname, password, premium, newsletter)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, email, username, fullname, password, profile_photo, about,
                  contact_telegram, contact_messenger, contact_whatsapp, premium,
                  newsletter, created_at
        "#,
    )
    .bind(new.email)
    .bind(new.username)
    .bind(new.fullname)
    .bind(new.password_hash)
    .bind(new.premium)
    .bind(new.newsletter)
    .fetch_one(pool)
    .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, username, fullname, password, profile_photo, about,
               contact_telegram, contact_messenger, contact_whatsapp, premium,
               newsletter, created_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn exists(pool: &PgPool, user_id: i32) -> Result<bool, sqlx::Error> {
    let (found,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(found)
}

pub async fn list(pool: &PgPool) -> Result<Vec<PublicUser>, sqlx::Error> {
    sqlx::query_as::<_, PublicUser>(
        "SELECT id, fullname, username, profile_photo FROM users ORDER BY id",
    )
    .fetch_all(pool)
    .await
}

pub async fn profile(pool: &PgPool, user_id: i32) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        r#"
        SELECT id, fullname, username, email, profile_photo, about,
               contact_telegram, contact_messenger, contact_whatsapp
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub struct ProfileUpdate<'a> {
    pub fullname: Option<&'a str>,
    pub about: Option<&'a str>,
    pub contact_telegram: Option<&'a str>,
    pub contact_messenger: Option<&'a str>,
    pub contact_whatsapp: Option<&'a str>,
    pub newsletter: Option<bool>,
}

/// Apply the provided fields, leaving absent ones untouched.
pub async fn update_profile(
    pool: &PgPool,
    user_id: i32,
    update: ProfileUpdate<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE users
        SET fullname = COALESCE($2, fullname),
            about = COALESCE($3, about),
            contact_telegram = COALESCE($4, contact_telegram),
            contact_messenger = COALESCE($5, contact_messenger),
            contact_whatsapp = COALESCE($6, contact_whatsapp),
            newsletter = COALESCE($7, newsletter)
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(update.fullname)
    .bind(update.about)
    .bind(update.contact_telegram)
    .bind(update.contact_messenger)
    .bind(update.contact_whatsapp)
    .bind(update.newsletter)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_profile_photo(
    pool: &PgPool,
    user_id: i32,
    photo_key: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET profile_photo = $2 WHERE id = $1")
        .bind(user_id)
        .bind(photo_key)
        .execute(pool)
        .await?;
    Ok(())
}

/// Substring search over username and fullname, case-insensitive.
pub async fn search(pool: &PgPool, query: &str) -> Result<Vec<PublicUser>, sqlx::Error> {
    sqlx::query_as::<_, PublicUser>(
        r#"
        SELECT id, fullname, username, profile_photo
        FROM users
        WHERE username ILIKE '%' || $1 || '%' OR fullname ILIKE '%' || $1 || '%'
        ORDER BY fullname, id
        "#,
    )
    .bind(query)
    .fetch_all(pool)
    .await
}
