//! Step endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use snotes_common::models::{OkResponse, Step, StepWithCells};
use snotes_common::validation::{CreateItemRequest, UpdateItemRequest};
use snotes_common::ProjectEvent;
use tracing::info;

use super::extract::{parse_id, ValidJson};
use crate::auth::SessionUser;
use crate::db::steps;
use crate::error::{ApiError, ApiResult};
use crate::guard::{self, Access, ProjectScope};
use crate::AppState;

/// POST /api/projects/:projectId/steps
///
/// Appends the step and one incomplete cell per existing song. The new cells
/// travel with the event so subscribers see the whole column at once.
pub async fn add_step(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(project_id): Path<String>,
    ValidJson(body): ValidJson<CreateItemRequest>,
) -> ApiResult<(StatusCode, Json<StepWithCells>)> {
    let project_id = parse_id(&project_id, "Project")?;
    guard::authorize(&state.db, ProjectScope::Project(project_id), &user.id, Access::Member).await?;

    let (step, cells) = steps::insert_step(&state.db, project_id, &body.name).await?;
    info!(
        "User {} added step {} to project {} ({} cells)",
        user.id,
        step.id,
        project_id,
        cells.len()
    );

    state.events.publish(
        project_id,
        ProjectEvent::StepAdded {
            step: step.clone(),
            cells: cells.clone(),
        },
    );
    Ok((StatusCode::CREATED, Json(StepWithCells { step, cells })))
}

/// PATCH /api/steps/:id
pub async fn update_step(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateItemRequest>,
) -> ApiResult<Json<Step>> {
    let step_id = parse_id(&id, "Step")?;
    let project_id =
        guard::authorize(&state.db, ProjectScope::Step(step_id), &user.id, Access::Member).await?;

    let step = steps::update_step(&state.db, step_id, &body)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Step {}", step_id)))?;

    state.events.publish(project_id, ProjectEvent::StepUpdated { step: step.clone() });
    Ok(Json(step))
}

/// DELETE /api/steps/:id
pub async fn delete_step(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<OkResponse>> {
    let step_id = parse_id(&id, "Step")?;
    let project_id =
        guard::authorize(&state.db, ProjectScope::Step(step_id), &user.id, Access::Member).await?;

    if !steps::delete_step(&state.db, step_id).await? {
        return Err(ApiError::NotFound(format!("Step {}", step_id)));
    }

    info!("User {} deleted step {}", user.id, step_id);
    state.events.publish(project_id, ProjectEvent::StepDeleted { step_id });
    Ok(Json(OkResponse::ok()))
}
