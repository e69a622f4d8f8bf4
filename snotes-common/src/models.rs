//! Entity models shared by the server and the sync client
//!
//! All models serialize with camelCase field names, matching the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shared workspace, root of all project-scoped data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    /// Six-character uppercase alphanumeric join code
    pub invite_code: String,
    /// User id of the creator (owner)
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership of one user in one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: String,
    pub joined_at: DateTime<Utc>,
    /// Display name from the auth provider, when known
    #[serde(default)]
    pub user_name: Option<String>,
    /// Avatar reference from the auth provider, when known
    #[serde(default)]
    pub user_image: Option<String>,
}

/// Row axis of the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

/// Column axis of the grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

/// Intersection of one song and one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub id: Uuid,
    pub song_id: Uuid,
    pub step_id: Uuid,
    pub is_complete: bool,
    pub completed_by: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Timestamped annotation on a cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub cell_id: Uuid,
    /// Author user id
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Full project state returned by `GET /api/projects/:id`
///
/// Clients treat this as ground truth after any invalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    #[serde(flatten)]
    pub project: Project,
    pub songs: Vec<Song>,
    pub steps: Vec<Step>,
    pub cells: Vec<Cell>,
    pub members: Vec<ProjectMember>,
}

impl ProjectSnapshot {
    /// Find a cell by id
    pub fn cell(&self, cell_id: Uuid) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == cell_id)
    }

    /// Find a cell by id for in-place modification
    pub fn cell_mut(&mut self, cell_id: Uuid) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| c.id == cell_id)
    }
}

/// Response body of `POST /api/projects/:projectId/steps`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepWithCells {
    pub step: Step,
    pub cells: Vec<Cell>,
}

/// Response body of delete operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
