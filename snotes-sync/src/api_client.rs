//! HTTP API client
//!
//! One method per server operation. Every request carries the session token
//! as a bearer header.

use std::time::Duration;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use snotes_common::models::{Cell, Note, OkResponse, Project, ProjectSnapshot, Song, Step, StepWithCells};
use snotes_common::validation::UpdateItemRequest;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, SyncError};

const USER_AGENT: &str = concat!("snotes-sync/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Session Notes API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session_token: String,
}

impl ApiClient {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:3000`)
    pub fn new(base_url: impl Into<String>, session_token: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(SyncError::Config(format!(
                "base URL must be http(s), got {}",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url,
            session_token: session_token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    /// WebSocket URL of a project's channel
    pub fn socket_url(&self, project_id: Uuid) -> String {
        let ws_base = match self.base_url.strip_prefix("http") {
            Some(rest) => format!("ws{}", rest),
            None => self.base_url.clone(),
        };
        format!("{}/ws/projects/{}", ws_base, project_id)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.session_token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let (code, message) = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => (body.error.code, body.error.message),
                Err(_) => (status.as_str().to_string(), text),
            };
            debug!("API request failed with {}: {}", status, message);
            return Err(SyncError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.send(self.request(Method::GET, "/api/projects")).await
    }

    pub async fn create_project(&self, name: &str) -> Result<Project> {
        self.send(self.request(Method::POST, "/api/projects").json(&json!({ "name": name })))
            .await
    }

    pub async fn join_project(&self, invite_code: &str) -> Result<Project> {
        self.send(
            self.request(Method::POST, "/api/projects/join")
                .json(&json!({ "inviteCode": invite_code })),
        )
        .await
    }

    /// Full snapshot: project, songs, steps, cells and members
    pub async fn get_project(&self, project_id: Uuid) -> Result<ProjectSnapshot> {
        self.send(self.request(Method::GET, &format!("/api/projects/{}", project_id)))
            .await
    }

    pub async fn delete_project(&self, project_id: Uuid) -> Result<OkResponse> {
        self.send(self.request(Method::DELETE, &format!("/api/projects/{}", project_id)))
            .await
    }

    pub async fn add_song(&self, project_id: Uuid, name: &str) -> Result<Song> {
        self.send(
            self.request(Method::POST, &format!("/api/projects/{}/songs", project_id))
                .json(&json!({ "name": name })),
        )
        .await
    }

    pub async fn update_song(&self, song_id: Uuid, changes: &UpdateItemRequest) -> Result<Song> {
        self.send(self.request(Method::PATCH, &format!("/api/songs/{}", song_id)).json(changes))
            .await
    }

    pub async fn delete_song(&self, song_id: Uuid) -> Result<OkResponse> {
        self.send(self.request(Method::DELETE, &format!("/api/songs/{}", song_id)))
            .await
    }

    pub async fn add_step(&self, project_id: Uuid, name: &str) -> Result<StepWithCells> {
        self.send(
            self.request(Method::POST, &format!("/api/projects/{}/steps", project_id))
                .json(&json!({ "name": name })),
        )
        .await
    }

    pub async fn update_step(&self, step_id: Uuid, changes: &UpdateItemRequest) -> Result<Step> {
        self.send(self.request(Method::PATCH, &format!("/api/steps/{}", step_id)).json(changes))
            .await
    }

    pub async fn delete_step(&self, step_id: Uuid) -> Result<OkResponse> {
        self.send(self.request(Method::DELETE, &format!("/api/steps/{}", step_id)))
            .await
    }

    pub async fn toggle_cell(&self, cell_id: Uuid, is_complete: bool) -> Result<Cell> {
        self.send(
            self.request(Method::PATCH, &format!("/api/cells/{}", cell_id))
                .json(&json!({ "isComplete": is_complete })),
        )
        .await
    }

    /// Notes of one cell, oldest first
    pub async fn list_notes(&self, cell_id: Uuid) -> Result<Vec<Note>> {
        self.send(self.request(Method::GET, &format!("/api/cells/{}/notes", cell_id)))
            .await
    }

    pub async fn add_note(&self, cell_id: Uuid, content: &str) -> Result<Note> {
        self.send(
            self.request(Method::POST, &format!("/api/cells/{}/notes", cell_id))
                .json(&json!({ "content": content })),
        )
        .await
    }
}
