//! Step persistence

use snotes_common::models::{Cell, Step};
use snotes_common::validation::UpdateItemRequest;
use snotes_common::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::grid::{self, Axis};

/// Append a step and create one cell per existing song
pub async fn insert_step(pool: &SqlitePool, project_id: Uuid, name: &str) -> Result<(Step, Vec<Cell>)> {
    let (item, cells) = grid::insert_with_cells(pool, Axis::Step, project_id, name).await?;
    Ok((item.into(), cells))
}

/// Steps of a project ordered by position
pub async fn list_steps(pool: &SqlitePool, project_id: Uuid) -> Result<Vec<Step>> {
    let items = grid::list(pool, Axis::Step, project_id).await?;
    Ok(items.into_iter().map(Step::from).collect())
}

pub async fn update_step(
    pool: &SqlitePool,
    step_id: Uuid,
    changes: &UpdateItemRequest,
) -> Result<Option<Step>> {
    Ok(grid::update(pool, Axis::Step, step_id, changes).await?.map(Step::from))
}

/// Delete a step together with its cells
pub async fn delete_step(pool: &SqlitePool, step_id: Uuid) -> Result<bool> {
    grid::delete(pool, Axis::Step, step_id).await
}
