//! Request bodies and their validation rules
//!
//! Every mutation validates its body before touching the store. Lengths are
//! counted in characters, not bytes.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const PROJECT_NAME_MAX: usize = 100;
pub const ITEM_NAME_MAX: usize = 200;
pub const INVITE_CODE_LEN: usize = 6;
pub const NOTE_CONTENT_MAX: usize = 5000;

/// Input that can check its own bounds
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(Error::InvalidInput(format!(
            "{} must be between {} and {} characters (got {})",
            field, min, max, len
        )));
    }
    Ok(())
}

/// `POST /api/projects`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

impl Validate for CreateProjectRequest {
    fn validate(&self) -> Result<()> {
        check_length("name", &self.name, 1, PROJECT_NAME_MAX)
    }
}

/// `POST /api/projects/join`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinProjectRequest {
    pub invite_code: String,
}

impl Validate for JoinProjectRequest {
    fn validate(&self) -> Result<()> {
        check_length("inviteCode", &self.invite_code, INVITE_CODE_LEN, INVITE_CODE_LEN)
    }
}

/// `POST /api/projects/:projectId/songs` and `.../steps`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
}

impl Validate for CreateItemRequest {
    fn validate(&self) -> Result<()> {
        check_length("name", &self.name, 1, ITEM_NAME_MAX)
    }
}

/// `PATCH /api/songs/:id` and `PATCH /api/steps/:id`
///
/// Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItemRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
}

impl Validate for UpdateItemRequest {
    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            check_length("name", name, 1, ITEM_NAME_MAX)?;
        }
        if let Some(position) = self.position {
            if position < 0 {
                return Err(Error::InvalidInput(format!(
                    "position must be a non-negative integer (got {})",
                    position
                )));
            }
        }
        Ok(())
    }
}

/// `PATCH /api/cells/:id`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleCellRequest {
    pub is_complete: bool,
}

impl Validate for ToggleCellRequest {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// `POST /api/cells/:cellId/notes`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub content: String,
}

impl Validate for CreateNoteRequest {
    fn validate(&self) -> Result<()> {
        check_length("content", &self.content, 1, NOTE_CONTENT_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_name_bounds() {
        assert!(CreateProjectRequest { name: "Tour".into() }.validate().is_ok());
        assert!(CreateProjectRequest { name: String::new() }.validate().is_err());
        assert!(CreateProjectRequest { name: "x".repeat(100) }.validate().is_ok());
        assert!(CreateProjectRequest { name: "x".repeat(101) }.validate().is_err());
    }

    #[test]
    fn test_lengths_count_characters() {
        // 200 multi-byte characters is still within bounds
        let name = "é".repeat(200);
        assert!(name.len() > ITEM_NAME_MAX);
        assert!(CreateItemRequest { name }.validate().is_ok());
    }

    #[test]
    fn test_invite_code_must_be_six_chars() {
        assert!(JoinProjectRequest { invite_code: "abc123".into() }.validate().is_ok());
        assert!(JoinProjectRequest { invite_code: "ABC12".into() }.validate().is_err());
        assert!(JoinProjectRequest { invite_code: "ABC1234".into() }.validate().is_err());
    }

    #[test]
    fn test_update_item_rules() {
        assert!(UpdateItemRequest::default().validate().is_ok());
        let negative = UpdateItemRequest { name: None, position: Some(-1) };
        assert!(matches!(negative.validate(), Err(Error::InvalidInput(_))));
        let empty_name = UpdateItemRequest { name: Some(String::new()), position: None };
        assert!(empty_name.validate().is_err());
        let ok = UpdateItemRequest { name: Some("Verse".into()), position: Some(0) };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_note_content_bounds() {
        assert!(CreateNoteRequest { content: "x".repeat(5000) }.validate().is_ok());
        assert!(CreateNoteRequest { content: "x".repeat(5001) }.validate().is_err());
        assert!(CreateNoteRequest { content: String::new() }.validate().is_err());
    }

    #[test]
    fn test_toggle_body_uses_camel_case() {
        let req: ToggleCellRequest = serde_json::from_str(r#"{"isComplete":true}"#).unwrap();
        assert!(req.is_complete);
        assert!(serde_json::from_str::<ToggleCellRequest>(r#"{"isComplete":"yes"}"#).is_err());
    }

    #[test]
    fn test_fractional_position_is_rejected_at_parse() {
        assert!(serde_json::from_str::<UpdateItemRequest>(r#"{"position":1.5}"#).is_err());
    }
}
