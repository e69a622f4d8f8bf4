//! Note thread endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use snotes_common::models::Note;
use snotes_common::validation::CreateNoteRequest;
use snotes_common::ProjectEvent;
use tracing::info;

use super::extract::{parse_id, ValidJson};
use crate::auth::SessionUser;
use crate::db::notes;
use crate::error::ApiResult;
use crate::guard::{self, Access, ProjectScope};
use crate::AppState;

/// GET /api/cells/:cellId/notes
///
/// Oldest first. Requires membership like every other project read.
pub async fn list_notes(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(cell_id): Path<String>,
) -> ApiResult<Json<Vec<Note>>> {
    let cell_id = parse_id(&cell_id, "Cell")?;
    guard::authorize(&state.db, ProjectScope::Cell(cell_id), &user.id, Access::Member).await?;

    Ok(Json(notes::list_notes(&state.db, cell_id).await?))
}

/// POST /api/cells/:cellId/notes
pub async fn add_note(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(cell_id): Path<String>,
    ValidJson(body): ValidJson<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    let cell_id = parse_id(&cell_id, "Cell")?;
    let project_id =
        guard::authorize(&state.db, ProjectScope::Cell(cell_id), &user.id, Access::Member).await?;

    let note = notes::insert_note(&state.db, cell_id, &user.id, &body.content).await?;
    info!("User {} added note {} to cell {}", user.id, note.id, cell_id);

    state.events.publish(project_id, ProjectEvent::NoteAdded { note: note.clone() });
    Ok((StatusCode::CREATED, Json(note)))
}
