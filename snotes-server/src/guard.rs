//! Authorization guard
//!
//! Every project-scoped operation resolves its target to the owning project
//! and then checks the caller's relation to that project. A missing target is
//! reported before a missing permission, so non-members learn nothing beyond
//! "not found" for ids that do not exist.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::db::{members, uuid_column};
use crate::error::{ApiError, ApiResult};

/// Entity an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    Project(Uuid),
    Song(Uuid),
    Step(Uuid),
    Cell(Uuid),
    Note(Uuid),
}

impl ProjectScope {
    fn kind(&self) -> &'static str {
        match self {
            ProjectScope::Project(_) => "Project",
            ProjectScope::Song(_) => "Song",
            ProjectScope::Step(_) => "Step",
            ProjectScope::Cell(_) => "Cell",
            ProjectScope::Note(_) => "Note",
        }
    }

    fn lookup_sql(&self) -> &'static str {
        match self {
            ProjectScope::Project(_) => "SELECT id AS project_id FROM projects WHERE id = ?",
            ProjectScope::Song(_) => "SELECT project_id FROM songs WHERE id = ?",
            ProjectScope::Step(_) => "SELECT project_id FROM steps WHERE id = ?",
            ProjectScope::Cell(_) => {
                "SELECT s.project_id FROM cells c JOIN songs s ON s.id = c.song_id WHERE c.id = ?"
            }
            ProjectScope::Note(_) => {
                r#"
                SELECT s.project_id
                FROM notes n
                JOIN cells c ON c.id = n.cell_id
                JOIN songs s ON s.id = c.song_id
                WHERE n.id = ?
                "#
            }
        }
    }

    fn id(&self) -> Uuid {
        match *self {
            ProjectScope::Project(id)
            | ProjectScope::Song(id)
            | ProjectScope::Step(id)
            | ProjectScope::Cell(id)
            | ProjectScope::Note(id) => id,
        }
    }
}

/// Relation the caller must have with the project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Any member, the owner included
    Member,
    /// Only the creator
    Owner,
}

/// Project owning the scoped entity, or `None` when it does not exist
pub async fn resolve_project(pool: &SqlitePool, scope: ProjectScope) -> ApiResult<Option<Uuid>> {
    let row = sqlx::query(scope.lookup_sql())
        .bind(scope.id().to_string())
        .fetch_optional(pool)
        .await?;

    Ok(row.as_ref().map(|r| uuid_column(r, "project_id")).transpose()?)
}

pub async fn is_member(pool: &SqlitePool, project_id: Uuid, user_id: &str) -> ApiResult<bool> {
    Ok(members::is_member(pool, project_id, user_id).await?)
}

pub async fn is_owner(pool: &SqlitePool, project_id: Uuid, user_id: &str) -> ApiResult<bool> {
    let created_by: Option<String> = sqlx::query("SELECT created_by FROM projects WHERE id = ?")
        .bind(project_id.to_string())
        .fetch_optional(pool)
        .await?
        .map(|row| row.try_get("created_by"))
        .transpose()?;

    Ok(created_by.as_deref() == Some(user_id))
}

/// Resolve `scope` and check `access` for `user_id`
///
/// Returns the owning project id on success, `NotFound` when the entity is
/// absent and `Forbidden` when the caller lacks the relation.
pub async fn authorize(
    pool: &SqlitePool,
    scope: ProjectScope,
    user_id: &str,
    access: Access,
) -> ApiResult<Uuid> {
    let project_id = resolve_project(pool, scope)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} {}", scope.kind(), scope.id())))?;

    let allowed = match access {
        Access::Member => is_member(pool, project_id, user_id).await?,
        Access::Owner => is_owner(pool, project_id, user_id).await?,
    };

    if !allowed {
        return Err(match access {
            Access::Member => ApiError::Forbidden("Not a member of this project".to_string()),
            Access::Owner => ApiError::Forbidden("Only the project owner can do this".to_string()),
        });
    }

    Ok(project_id)
}
