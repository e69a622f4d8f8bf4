//! Shared storage for the two grid axes
//!
//! Songs and steps have identical shape and lifecycle; they differ only in
//! table name and in which side of a cell they occupy.

use chrono::{DateTime, Utc};
use snotes_common::models::{Cell, Song, Step};
use snotes_common::validation::UpdateItemRequest;
use snotes_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::{cells, uuid_column};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Song,
    Step,
}

impl Axis {
    fn table(self) -> &'static str {
        match self {
            Axis::Song => "songs",
            Axis::Step => "steps",
        }
    }

    fn other(self) -> Axis {
        match self {
            Axis::Song => Axis::Step,
            Axis::Step => Axis::Song,
        }
    }
}

/// Row of either axis table
#[derive(Debug, Clone)]
pub(crate) struct AxisItem {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

impl AxisItem {
    fn from_row(row: &SqliteRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            id: uuid_column(row, "id")?,
            project_id: uuid_column(row, "project_id")?,
            name: row.try_get("name")?,
            position: row.try_get("position")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<AxisItem> for Song {
    fn from(item: AxisItem) -> Self {
        Song {
            id: item.id,
            project_id: item.project_id,
            name: item.name,
            position: item.position,
            created_at: item.created_at,
        }
    }
}

impl From<AxisItem> for Step {
    fn from(item: AxisItem) -> Self {
        Step {
            id: item.id,
            project_id: item.project_id,
            name: item.name,
            position: item.position,
            created_at: item.created_at,
        }
    }
}

async fn fetch_item<'e, E: SqliteExecutor<'e>>(
    executor: E,
    axis: Axis,
    id: Uuid,
) -> Result<Option<AxisItem>> {
    let sql = format!(
        "SELECT id, project_id, name, position, created_at FROM {} WHERE id = ?",
        axis.table()
    );
    let row = sqlx::query(&sql)
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?;

    Ok(row.as_ref().map(AxisItem::from_row).transpose()?)
}

/// Append an item at `max(position) + 1` and materialize one cell per item
/// on the other axis
///
/// The position is computed by the INSERT itself inside a write transaction,
/// so concurrent appends to one project never share a position.
pub(crate) async fn insert_with_cells(
    pool: &SqlitePool,
    axis: Axis,
    project_id: Uuid,
    name: &str,
) -> Result<(AxisItem, Vec<Cell>)> {
    let id = Uuid::new_v4();
    let table = axis.table();
    let mut tx = pool.begin().await?;

    let insert = format!(
        r#"
        INSERT INTO {table} (id, project_id, name, position, created_at)
        SELECT ?, ?, ?, COALESCE(MAX(position), -1) + 1, ?
        FROM {table} WHERE project_id = ?
        "#
    );
    sqlx::query(&insert)
        .bind(id.to_string())
        .bind(project_id.to_string())
        .bind(name)
        .bind(time::now())
        .bind(project_id.to_string())
        .execute(&mut *tx)
        .await?;

    let others_sql = format!(
        "SELECT id FROM {} WHERE project_id = ? ORDER BY position, rowid",
        axis.other().table()
    );
    let other_rows = sqlx::query(&others_sql)
        .bind(project_id.to_string())
        .fetch_all(&mut *tx)
        .await?;

    let mut created = Vec::with_capacity(other_rows.len());
    for row in &other_rows {
        let other_id = uuid_column(row, "id")?;
        let (song_id, step_id) = match axis {
            Axis::Song => (id, other_id),
            Axis::Step => (other_id, id),
        };
        created.push(cells::insert_cell(&mut *tx, song_id, step_id).await?);
    }

    let item = fetch_item(&mut *tx, axis, id)
        .await?
        .ok_or_else(|| snotes_common::Error::Internal(format!("{} {} vanished", table, id)))?;

    tx.commit().await?;
    Ok((item, created))
}

/// Items of one project in display order
pub(crate) async fn list(pool: &SqlitePool, axis: Axis, project_id: Uuid) -> Result<Vec<AxisItem>> {
    let sql = format!(
        r#"
        SELECT id, project_id, name, position, created_at
        FROM {}
        WHERE project_id = ?
        ORDER BY position, created_at, rowid
        "#,
        axis.table()
    );
    let rows = sqlx::query(&sql)
        .bind(project_id.to_string())
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(AxisItem::from_row)
        .collect::<std::result::Result<Vec<_>, _>>()?)
}

/// Partial update; absent fields keep their stored value
///
/// Returns `None` when the item does not exist.
pub(crate) async fn update(
    pool: &SqlitePool,
    axis: Axis,
    id: Uuid,
    changes: &UpdateItemRequest,
) -> Result<Option<AxisItem>> {
    let sql = format!(
        "UPDATE {} SET name = COALESCE(?, name), position = COALESCE(?, position) WHERE id = ?",
        axis.table()
    );
    let result = sqlx::query(&sql)
        .bind(changes.name.as_deref())
        .bind(changes.position)
        .bind(id.to_string())
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    fetch_item(pool, axis, id).await
}

/// Delete an item; its cells and their notes cascade
pub(crate) async fn delete(pool: &SqlitePool, axis: Axis, id: Uuid) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE id = ?", axis.table());
    let result = sqlx::query(&sql)
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
