//! Song persistence

use snotes_common::models::{Cell, Song};
use snotes_common::validation::UpdateItemRequest;
use snotes_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::grid::{self, Axis};

/// Append a song and create one cell per existing step
pub async fn insert_song(pool: &SqlitePool, project_id: Uuid, name: &str) -> Result<(Song, Vec<Cell>)> {
    let (item, cells) = grid::insert_with_cells(pool, Axis::Song, project_id, name).await?;
    Ok((item.into(), cells))
}

/// Songs of a project ordered by position
pub async fn list_songs(pool: &SqlitePool, project_id: Uuid) -> Result<Vec<Song>> {
    let items = grid::list(pool, Axis::Song, project_id).await?;
    Ok(items.into_iter().map(Song::from).collect())
}

pub async fn update_song(
    pool: &SqlitePool,
    song_id: Uuid,
    changes: &UpdateItemRequest,
) -> Result<Option<Song>> {
    Ok(grid::update(pool, Axis::Song, song_id, changes).await?.map(Song::from))
}

/// Delete a song together with its cells
pub async fn delete_song(pool: &SqlitePool, song_id: Uuid) -> Result<bool> {
    grid::delete(pool, Axis::Song, song_id).await
}
