//! Note persistence (append-only)

use snotes_common::models::Note;
use snotes_common::{time, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::uuid_column;

fn note_from_row(row: &SqliteRow) -> std::result::Result<Note, sqlx::Error> {
    Ok(Note {
        id: uuid_column(row, "id")?,
        cell_id: uuid_column(row, "cell_id")?,
        user_id: row.try_get("user_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn insert_note(pool: &SqlitePool, cell_id: Uuid, user_id: &str, content: &str) -> Result<Note> {
    let note = Note {
        id: Uuid::new_v4(),
        cell_id,
        user_id: user_id.to_string(),
        content: content.to_string(),
        created_at: time::now(),
    };

    sqlx::query("INSERT INTO notes (id, cell_id, user_id, content, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(note.id.to_string())
        .bind(cell_id.to_string())
        .bind(&note.user_id)
        .bind(&note.content)
        .bind(note.created_at)
        .execute(pool)
        .await?;

    Ok(note)
}

/// Notes of a cell, oldest first
pub async fn list_notes(pool: &SqlitePool, cell_id: Uuid) -> Result<Vec<Note>> {
    let rows = sqlx::query(
        r#"
        SELECT id, cell_id, user_id, content, created_at
        FROM notes
        WHERE cell_id = ?
        ORDER BY created_at, rowid
        "#,
    )
    .bind(cell_id.to_string())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(note_from_row)
        .collect::<std::result::Result<Vec<_>, _>>()?)
}
