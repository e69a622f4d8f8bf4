//! Auth provider tables
//!
//! The external auth provider owns `users` and `sessions`. These writers
//! exist for the provider bridge and for seeding test databases.

use chrono::{DateTime, Utc};
use snotes_common::Result;
use sqlx::SqlitePool;

/// Insert or refresh a user's profile
pub async fn upsert_user(
    pool: &SqlitePool,
    id: &str,
    name: &str,
    email: &str,
    image: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, image)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            email = excluded.email,
            image = excluded.image
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(image)
    .execute(pool)
    .await?;

    Ok(())
}

/// Record a session token for a user
pub async fn insert_session(
    pool: &SqlitePool,
    token: &str,
    user_id: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES (?, ?, ?)")
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;

    Ok(())
}
