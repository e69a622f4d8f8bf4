//! Cell persistence
//!
//! Cells are only created as a side effect of adding a song or step.

use snotes_common::models::Cell;
use snotes_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::uuid_column;

const CELL_COLUMNS: &str =
    "c.id, c.song_id, c.step_id, c.is_complete, c.completed_by, c.completed_at, c.created_at";

fn cell_from_row(row: &SqliteRow) -> std::result::Result<Cell, sqlx::Error> {
    Ok(Cell {
        id: uuid_column(row, "id")?,
        song_id: uuid_column(row, "song_id")?,
        step_id: uuid_column(row, "step_id")?,
        is_complete: row.try_get("is_complete")?,
        completed_by: row.try_get("completed_by")?,
        completed_at: row.try_get("completed_at")?,
        created_at: row.try_get("created_at")?,
    })
}

async fn fetch_cell<'e, E: SqliteExecutor<'e>>(executor: E, cell_id: Uuid) -> Result<Option<Cell>> {
    let sql = format!("SELECT {} FROM cells c WHERE c.id = ?", CELL_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(cell_id.to_string())
        .fetch_optional(executor)
        .await?;

    Ok(row.as_ref().map(cell_from_row).transpose()?)
}

/// Insert an incomplete cell for a (song, step) pair
pub(crate) async fn insert_cell<'e, E: SqliteExecutor<'e>>(
    executor: E,
    song_id: Uuid,
    step_id: Uuid,
) -> Result<Cell> {
    let cell = Cell {
        id: Uuid::new_v4(),
        song_id,
        step_id,
        is_complete: false,
        completed_by: None,
        completed_at: None,
        created_at: time::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO cells (id, song_id, step_id, is_complete, completed_by, completed_at, created_at)
        VALUES (?, ?, ?, 0, NULL, NULL, ?)
        "#,
    )
    .bind(cell.id.to_string())
    .bind(song_id.to_string())
    .bind(step_id.to_string())
    .bind(cell.created_at)
    .execute(executor)
    .await?;

    Ok(cell)
}

pub async fn get_cell(pool: &SqlitePool, cell_id: Uuid) -> Result<Option<Cell>> {
    fetch_cell(pool, cell_id).await
}

/// Every cell of a project, reached through its songs
pub async fn list_cells(pool: &SqlitePool, project_id: Uuid) -> Result<Vec<Cell>> {
    let sql = format!(
        r#"
        SELECT {}
        FROM cells c
        JOIN songs s ON s.id = c.song_id
        WHERE s.project_id = ?
        ORDER BY c.created_at, c.rowid
        "#,
        CELL_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(project_id.to_string())
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(cell_from_row)
        .collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Set completion state
///
/// Completing records the acting user and the current time; clearing resets
/// both to NULL. Returns `None` when the cell does not exist.
pub async fn set_completion(
    pool: &SqlitePool,
    cell_id: Uuid,
    is_complete: bool,
    user_id: &str,
) -> Result<Option<Cell>> {
    let (completed_by, completed_at) = if is_complete {
        (Some(user_id), Some(time::now()))
    } else {
        (None, None)
    };

    let result = sqlx::query(
        "UPDATE cells SET is_complete = ?, completed_by = ?, completed_at = ? WHERE id = ?",
    )
    .bind(is_complete)
    .bind(completed_by)
    .bind(completed_at)
    .bind(cell_id.to_string())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    fetch_cell(pool, cell_id).await
}
