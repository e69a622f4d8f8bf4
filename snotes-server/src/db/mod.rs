//! Relational store queries
//!
//! Each public function is one statement or one transaction. Ids are stored
//! as TEXT; rows are mapped by hand into the shared models.

pub mod cells;
mod grid;
pub mod members;
pub mod notes;
pub mod projects;
pub mod songs;
pub mod steps;
pub mod users;

use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Read a TEXT column holding a UUID
pub(crate) fn uuid_column(row: &SqliteRow, column: &str) -> Result<Uuid, sqlx::Error> {
    let text: String = row.try_get(column)?;
    Uuid::parse_str(&text).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Whether an insert failed on a UNIQUE constraint
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
