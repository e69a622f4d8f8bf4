//! Cell endpoint

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use snotes_common::models::Cell;
use snotes_common::validation::ToggleCellRequest;
use snotes_common::ProjectEvent;
use tracing::info;

use super::extract::{parse_id, ValidJson};
use crate::auth::SessionUser;
use crate::db::cells;
use crate::error::{ApiError, ApiResult};
use crate::guard::{self, Access, ProjectScope};
use crate::AppState;

/// PATCH /api/cells/:id
///
/// Completing stamps the caller and the time; clearing removes both. Two
/// concurrent toggles race and the last write wins; both are broadcast.
pub async fn toggle_cell(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<ToggleCellRequest>,
) -> ApiResult<Json<Cell>> {
    let cell_id = parse_id(&id, "Cell")?;
    let project_id =
        guard::authorize(&state.db, ProjectScope::Cell(cell_id), &user.id, Access::Member).await?;

    let cell = cells::set_completion(&state.db, cell_id, body.is_complete, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Cell {}", cell_id)))?;

    info!(
        "User {} marked cell {} {}",
        user.id,
        cell_id,
        if cell.is_complete { "complete" } else { "incomplete" }
    );
    state.events.publish(project_id, ProjectEvent::CellUpdated { cell: cell.clone() });
    Ok(Json(cell))
}
