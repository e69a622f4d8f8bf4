//! Song endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use snotes_common::models::{OkResponse, Song};
use snotes_common::validation::{CreateItemRequest, UpdateItemRequest};
use snotes_common::ProjectEvent;
use tracing::info;

use super::extract::{parse_id, ValidJson};
use crate::auth::SessionUser;
use crate::db::songs;
use crate::error::{ApiError, ApiResult};
use crate::guard::{self, Access, ProjectScope};
use crate::AppState;

/// POST /api/projects/:projectId/songs
///
/// Appends the song and one incomplete cell per existing step.
pub async fn add_song(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(project_id): Path<String>,
    ValidJson(body): ValidJson<CreateItemRequest>,
) -> ApiResult<(StatusCode, Json<Song>)> {
    let project_id = parse_id(&project_id, "Project")?;
    guard::authorize(&state.db, ProjectScope::Project(project_id), &user.id, Access::Member).await?;

    let (song, cells) = songs::insert_song(&state.db, project_id, &body.name).await?;
    info!(
        "User {} added song {} to project {} ({} cells)",
        user.id,
        song.id,
        project_id,
        cells.len()
    );

    state.events.publish(project_id, ProjectEvent::SongAdded { song: song.clone() });
    Ok((StatusCode::CREATED, Json(song)))
}

/// PATCH /api/songs/:id
pub async fn update_song(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    ValidJson(body): ValidJson<UpdateItemRequest>,
) -> ApiResult<Json<Song>> {
    let song_id = parse_id(&id, "Song")?;
    let project_id =
        guard::authorize(&state.db, ProjectScope::Song(song_id), &user.id, Access::Member).await?;

    let song = songs::update_song(&state.db, song_id, &body)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Song {}", song_id)))?;

    state.events.publish(project_id, ProjectEvent::SongUpdated { song: song.clone() });
    Ok(Json(song))
}

/// DELETE /api/songs/:id
pub async fn delete_song(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<OkResponse>> {
    let song_id = parse_id(&id, "Song")?;
    let project_id =
        guard::authorize(&state.db, ProjectScope::Song(song_id), &user.id, Access::Member).await?;

    if !songs::delete_song(&state.db, song_id).await? {
        return Err(ApiError::NotFound(format!("Song {}", song_id)));
    }

    info!("User {} deleted song {}", user.id, song_id);
    state.events.publish(project_id, ProjectEvent::SongDeleted { song_id });
    Ok(Json(OkResponse::ok()))
}
