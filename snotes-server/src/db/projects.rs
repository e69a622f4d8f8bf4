//! Project persistence

use snotes_common::models::{Project, ProjectSnapshot};
use snotes_common::{invite_code, time, Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::warn;
use uuid::Uuid;

use super::{cells, is_unique_violation, members, songs, steps, uuid_column};

/// Attempts at drawing an unused invite code before giving up
pub const MAX_INVITE_CODE_ATTEMPTS: usize = 10;

const PROJECT_COLUMNS: &str = "p.id, p.name, p.invite_code, p.created_by, p.created_at, p.updated_at";

fn project_from_row(row: &SqliteRow) -> std::result::Result<Project, sqlx::Error> {
    Ok(Project {
        id: uuid_column(row, "id")?,
        name: row.try_get("name")?,
        invite_code: row.try_get("invite_code")?,
        created_by: row.try_get("created_by")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn invite_code_exists(pool: &SqlitePool, code: &str) -> Result<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE invite_code = ?")
        .bind(code)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// Create a project with a fresh invite code and enroll the creator
///
/// Codes are drawn until one is unused; the UNIQUE constraint catches a
/// collision that slips in between the check and the insert.
pub async fn create_project(pool: &SqlitePool, name: &str, owner_id: &str) -> Result<Project> {
    for attempt in 1..=MAX_INVITE_CODE_ATTEMPTS {
        let code = invite_code::generate();
        if invite_code_exists(pool, &code).await? {
            warn!("Invite code collision on attempt {}", attempt);
            continue;
        }

        match insert_project(pool, name, owner_id, &code).await {
            Ok(project) => return Ok(project),
            Err(Error::Database(e)) if is_unique_violation(&e) => {
                warn!("Invite code collision on insert, attempt {}", attempt);
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::Internal(format!(
        "No unused invite code after {} attempts",
        MAX_INVITE_CODE_ATTEMPTS
    )))
}

async fn insert_project(pool: &SqlitePool, name: &str, owner_id: &str, code: &str) -> Result<Project> {
    let now = time::now();
    let project = Project {
        id: Uuid::new_v4(),
        name: name.to_string(),
        invite_code: code.to_string(),
        created_by: owner_id.to_string(),
        created_at: now,
        updated_at: now,
    };

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO projects (id, name, invite_code, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(project.id.to_string())
    .bind(&project.name)
    .bind(&project.invite_code)
    .bind(&project.created_by)
    .bind(project.created_at)
    .bind(project.updated_at)
    .execute(&mut *tx)
    .await?;

    members::insert_member(&mut *tx, project.id, owner_id).await?;

    tx.commit().await?;
    Ok(project)
}

pub async fn get_project(pool: &SqlitePool, project_id: Uuid) -> Result<Option<Project>> {
    let sql = format!("SELECT {} FROM projects p WHERE p.id = ?", PROJECT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(project_id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(project_from_row).transpose()?)
}

/// Project with its songs, steps, cells and members
pub async fn load_snapshot(pool: &SqlitePool, project_id: Uuid) -> Result<Option<ProjectSnapshot>> {
    let Some(project) = get_project(pool, project_id).await? else {
        return Ok(None);
    };

    Ok(Some(ProjectSnapshot {
        project,
        songs: songs::list_songs(pool, project_id).await?,
        steps: steps::list_steps(pool, project_id).await?,
        cells: cells::list_cells(pool, project_id).await?,
        members: members::list_members(pool, project_id).await?,
    }))
}

/// Look up by invite code (expects the canonical uppercase form)
pub async fn find_by_invite_code(pool: &SqlitePool, code: &str) -> Result<Option<Project>> {
    let sql = format!("SELECT {} FROM projects p WHERE p.invite_code = ?", PROJECT_COLUMNS);
    let row = sqlx::query(&sql).bind(code).fetch_optional(pool).await?;

    Ok(row.as_ref().map(project_from_row).transpose()?)
}

/// Projects the user owns or belongs to, each listed once
pub async fn list_projects_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Project>> {
    let sql = format!(
        r#"
        SELECT DISTINCT {}
        FROM projects p
        LEFT JOIN project_members m ON m.project_id = p.id AND m.user_id = ?
        WHERE p.created_by = ? OR m.user_id IS NOT NULL
        ORDER BY p.created_at, p.id
        "#,
        PROJECT_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(project_from_row)
        .collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Delete a project; members, songs, steps, cells and notes cascade
pub async fn delete_project(pool: &SqlitePool, project_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(project_id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use snotes_common::db::init_memory_database;

    #[tokio::test]
    async fn test_create_project_enrolls_owner() {
        let pool = init_memory_database().await.unwrap();
        let project = create_project(&pool, "Album", "owner").await.unwrap();

        assert!(invite_code::is_well_formed(&project.invite_code));
        assert_eq!(project.created_by, "owner");
        assert!(members::is_member(&pool, project.id, "owner").await.unwrap());

        let found = find_by_invite_code(&pool, &project.invite_code).await.unwrap();
        assert_eq!(found, Some(project));
    }

    #[tokio::test]
    async fn test_list_projects_is_owned_plus_joined_without_duplicates() {
        let pool = init_memory_database().await.unwrap();
        let own = create_project(&pool, "Own", "alice").await.unwrap();
        let other = create_project(&pool, "Other", "bob").await.unwrap();
        let _unrelated = create_project(&pool, "Unrelated", "carol").await.unwrap();
        assert!(members::add_member(&pool, other.id, "alice").await.unwrap());

        let listed = list_projects_for_user(&pool, "alice").await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![own.id, other.id]);
    }

    #[tokio::test]
    async fn test_snapshot_of_missing_project() {
        let pool = init_memory_database().await.unwrap();
        assert!(load_snapshot(&pool, Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_cascades_to_grid() {
        let pool = init_memory_database().await.unwrap();
        let project = create_project(&pool, "Gone", "owner").await.unwrap();
        songs::insert_song(&pool, project.id, "Intro").await.unwrap();
        steps::insert_step(&pool, project.id, "Mix").await.unwrap();

        assert!(delete_project(&pool, project.id).await.unwrap());
        assert!(!delete_project(&pool, project.id).await.unwrap());

        let cells: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cells")
            .fetch_one(&pool)
            .await
            .unwrap();
        let members: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM project_members")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!((cells, members), (0, 0));
    }
}
