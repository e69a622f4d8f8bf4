//! Project change events
//!
//! Every successful mutation publishes at most one [`ProjectEvent`] on the
//! project's channel. On the wire an event is the envelope
//! `{"event": "<name>", "data": {...}}`, which serde produces directly from the
//! adjacently tagged enum.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Cell, Note, Song, Step};

/// Change notification delivered to every subscriber of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ProjectEvent {
    /// A user joined through the invite code
    MemberJoined { user_id: String, project_id: Uuid },

    /// A song was appended; its cells were materialized with it
    SongAdded { song: Song },

    /// Song name or position changed
    SongUpdated { song: Song },

    /// Song and its cells were removed
    SongDeleted { song_id: Uuid },

    /// A step was appended together with one cell per existing song
    StepAdded { step: Step, cells: Vec<Cell> },

    /// Step name or position changed
    StepUpdated { step: Step },

    /// Step and its cells were removed
    StepDeleted { step_id: Uuid },

    /// Cell completion toggled
    CellUpdated { cell: Cell },

    /// Note appended to a cell thread
    NoteAdded { note: Note },
}

impl ProjectEvent {
    /// Wire name of the event (the `event` field of the envelope)
    pub fn name(&self) -> &'static str {
        match self {
            ProjectEvent::MemberJoined { .. } => "member-joined",
            ProjectEvent::SongAdded { .. } => "song-added",
            ProjectEvent::SongUpdated { .. } => "song-updated",
            ProjectEvent::SongDeleted { .. } => "song-deleted",
            ProjectEvent::StepAdded { .. } => "step-added",
            ProjectEvent::StepUpdated { .. } => "step-updated",
            ProjectEvent::StepDeleted { .. } => "step-deleted",
            ProjectEvent::CellUpdated { .. } => "cell-updated",
            ProjectEvent::NoteAdded { .. } => "note-added",
        }
    }

    /// Whether receivers must also drop cached note threads
    pub fn invalidates_notes(&self) -> bool {
        matches!(self, ProjectEvent::NoteAdded { .. })
    }

    /// Serialize to the JSON envelope
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a JSON envelope
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
