//! # Session Notes Common Library
//!
//! Shared code for the Session Notes server and sync client:
//! - Entity models (projects, songs, steps, cells, notes)
//! - Typed project events and the wire envelope
//! - Request validation and invite codes
//! - Configuration loading
//! - SQLite schema initialization (behind the `sqlx` feature)

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod events;
pub mod invite_code;
pub mod models;
pub mod time;
pub mod validation;

pub use error::{Error, Result};
pub use events::ProjectEvent;
