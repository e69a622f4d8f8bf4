//! Project membership persistence

use snotes_common::models::ProjectMember;
use snotes_common::{time, Error, Result};
use sqlx::{Row, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::{is_unique_violation, uuid_column};

pub(crate) async fn insert_member<'e, E: SqliteExecutor<'e>>(
    executor: E,
    project_id: Uuid,
    user_id: &str,
) -> Result<()> {
    sqlx::query("INSERT INTO project_members (id, project_id, user_id, joined_at) VALUES (?, ?, ?, ?)")
        .bind(Uuid::new_v4().to_string())
        .bind(project_id.to_string())
        .bind(user_id)
        .bind(time::now())
        .execute(executor)
        .await?;
    Ok(())
}

/// Enroll a user; `false` when the membership already exists
pub async fn add_member(pool: &SqlitePool, project_id: Uuid, user_id: &str) -> Result<bool> {
    match insert_member(pool, project_id, user_id).await {
        Ok(()) => Ok(true),
        Err(Error::Database(e)) if is_unique_violation(&e) => Ok(false),
        Err(e) => Err(e),
    }
}

pub async fn is_member(pool: &SqlitePool, project_id: Uuid, user_id: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM project_members WHERE project_id = ? AND user_id = ?",
    )
    .bind(project_id.to_string())
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Members with the profile fields the auth provider knows about
pub async fn list_members(pool: &SqlitePool, project_id: Uuid) -> Result<Vec<ProjectMember>> {
    let rows = sqlx::query(
        r#"
        SELECT m.id, m.project_id, m.user_id, m.joined_at, u.name AS user_name, u.image AS user_image
        FROM project_members m
        LEFT JOIN users u ON u.id = m.user_id
        WHERE m.project_id = ?
        ORDER BY m.joined_at, m.rowid
        "#,
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await?;

    let mut members = Vec::with_capacity(rows.len());
    for row in &rows {
        members.push(ProjectMember {
            id: uuid_column(row, "id")?,
            project_id: uuid_column(row, "project_id")?,
            user_id: row.try_get("user_id")?,
            joined_at: row.try_get("joined_at")?,
            user_name: row.try_get("user_name")?,
            user_image: row.try_get("user_image")?,
        });
    }
    Ok(members)
}
