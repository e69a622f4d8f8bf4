//! Project endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use snotes_common::invite_code;
use snotes_common::models::{OkResponse, Project, ProjectSnapshot};
use snotes_common::validation::{CreateProjectRequest, JoinProjectRequest};
use snotes_common::ProjectEvent;
use tracing::info;

use super::extract::{parse_id, ValidJson};
use crate::auth::SessionUser;
use crate::db::{members, projects};
use crate::error::{ApiError, ApiResult};
use crate::guard::{self, Access, ProjectScope};
use crate::AppState;

/// GET /api/projects
///
/// Projects the caller owns or has joined.
pub async fn list_projects(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<Vec<Project>>> {
    let projects = projects::list_projects_for_user(&state.db, &user.id).await?;
    Ok(Json(projects))
}

/// POST /api/projects
///
/// Nobody can be subscribed to a new project yet, so nothing is published.
pub async fn create_project(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    ValidJson(body): ValidJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let project = projects::create_project(&state.db, &body.name, &user.id).await?;
    info!("User {} created project {} ({})", user.id, project.id, project.name);
    Ok((StatusCode::CREATED, Json(project)))
}

/// POST /api/projects/join
pub async fn join_project(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    ValidJson(body): ValidJson<JoinProjectRequest>,
) -> ApiResult<Json<Project>> {
    let code = invite_code::normalize(&body.invite_code);
    let project = projects::find_by_invite_code(&state.db, &code)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invalid invite code".to_string()))?;

    if guard::is_member(&state.db, project.id, &user.id).await? {
        return Err(ApiError::Conflict("Already a member of this project".to_string()));
    }
    // A concurrent join can still win the race; the UNIQUE constraint reports it here
    if !members::add_member(&state.db, project.id, &user.id).await? {
        return Err(ApiError::Conflict("Already a member of this project".to_string()));
    }

    info!("User {} joined project {}", user.id, project.id);
    state.events.publish(
        project.id,
        ProjectEvent::MemberJoined {
            user_id: user.id.clone(),
            project_id: project.id,
        },
    );

    Ok(Json(project))
}

/// GET /api/projects/:id
///
/// Full snapshot: project, songs, steps, cells and members.
pub async fn get_project(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectSnapshot>> {
    let project_id = parse_id(&id, "Project")?;
    guard::authorize(&state.db, ProjectScope::Project(project_id), &user.id, Access::Member).await?;

    let snapshot = projects::load_snapshot(&state.db, project_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Project {}", project_id)))?;
    Ok(Json(snapshot))
}

/// DELETE /api/projects/:id
///
/// Owner only. Subscribers find out through their next failed refetch.
pub async fn delete_project(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<OkResponse>> {
    let project_id = parse_id(&id, "Project")?;
    guard::authorize(&state.db, ProjectScope::Project(project_id), &user.id, Access::Owner).await?;

    if !projects::delete_project(&state.db, project_id).await? {
        return Err(ApiError::NotFound(format!("Project {}", project_id)));
    }

    info!("User {} deleted project {}", user.id, project_id);
    Ok(Json(OkResponse::ok()))
}
