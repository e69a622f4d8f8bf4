//! Mutations issued from a project view
//!
//! Each helper calls the API and then invalidates what the change touched, so
//! the view converges even before the server's event arrives.

use snotes_common::models::{Cell, Note, Song, StepWithCells};
use tracing::debug;
use uuid::Uuid;

use crate::api_client::ApiClient;
use crate::cache::ProjectCache;
use crate::error::Result;

/// Toggle a cell, showing the new state before the server answers
///
/// On success the cached cell becomes the server's copy. On failure the
/// previous value is restored and the error returned. Either way the snapshot
/// is marked stale, since a refresh may have landed while the request was in
/// flight.
pub async fn toggle_cell_optimistic(
    api: &ApiClient,
    cache: &ProjectCache,
    cell_id: Uuid,
    is_complete: bool,
) -> Result<Cell> {
    let previous = cache.apply_toggle(cell_id, is_complete);

    match api.toggle_cell(cell_id, is_complete).await {
        Ok(cell) => {
            cache.replace_cell(cell.clone());
            cache.invalidate_project();
            Ok(cell)
        }
        Err(e) => {
            if let Some(previous) = previous {
                debug!("Rolling back optimistic toggle of cell {}", cell_id);
                cache.replace_cell(previous);
            }
            cache.invalidate_project();
            Err(e)
        }
    }
}

pub async fn add_song(api: &ApiClient, cache: &ProjectCache, name: &str) -> Result<Song> {
    let song = api.add_song(cache.project_id(), name).await?;
    cache.invalidate_project();
    Ok(song)
}

pub async fn add_step(api: &ApiClient, cache: &ProjectCache, name: &str) -> Result<StepWithCells> {
    let created = api.add_step(cache.project_id(), name).await?;
    cache.invalidate_project();
    Ok(created)
}

/// Post a note and refresh that cell's thread
pub async fn add_note(
    api: &ApiClient,
    cache: &ProjectCache,
    cell_id: Uuid,
    content: &str,
) -> Result<Note> {
    let note = api.add_note(cell_id, content).await?;
    cache.invalidate_notes();
    cache.invalidate_project();
    Ok(note)
}
