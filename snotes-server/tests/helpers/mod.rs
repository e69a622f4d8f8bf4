//! Shared fixtures for snotes-server integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::Value;
use snotes_common::db::init_memory_database;
use snotes_common::ProjectEvent;
use snotes_server::auth::SqliteSessionStore;
use snotes_server::db::users;
use snotes_server::realtime::{ChannelHub, EventPublisher};
use snotes_server::{build_router, AppState};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot`
use uuid::Uuid;

pub const ALICE: &str = "alice-token";
pub const BOB: &str = "bob-token";
pub const CAROL: &str = "carol-token";
pub const EXPIRED: &str = "expired-token";

/// Forwards to the hub and remembers what was published
pub struct RecordingPublisher {
    hub: ChannelHub,
    published: Mutex<Vec<(Uuid, ProjectEvent)>>,
}

impl RecordingPublisher {
    pub fn new(hub: ChannelHub) -> Self {
        Self {
            hub,
            published: Mutex::new(Vec::new()),
        }
    }

    /// Drain everything published so far
    pub fn take(&self) -> Vec<(Uuid, ProjectEvent)> {
        std::mem::take(&mut *self.published.lock().unwrap())
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, project_id: Uuid, event: ProjectEvent) -> usize {
        self.published.lock().unwrap().push((project_id, event.clone()));
        self.hub.publish(project_id, event)
    }
}

pub struct TestApp {
    pub pool: SqlitePool,
    pub hub: ChannelHub,
    pub recorder: Arc<RecordingPublisher>,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = init_memory_database().await.expect("memory database");
        seed_users(&pool).await;

        let hub = ChannelHub::new(64);
        let recorder = Arc::new(RecordingPublisher::new(hub.clone()));
        let sessions = Arc::new(SqliteSessionStore::new(pool.clone()));
        let state = AppState::new(pool.clone(), hub.clone(), sessions)
            .with_publisher(recorder.clone());

        Self {
            pool,
            hub,
            recorder,
            router: build_router(state),
        }
    }

    /// Send one request through the router
    ///
    /// Returns the status and the parsed JSON body (`Null` when empty).
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        (status, extract_json(response.into_body()).await)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request("GET", uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request("PATCH", uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, Some(token), None).await
    }

    /// Create a project owned by the token's user and return its JSON
    pub async fn create_project(&self, token: &str, name: &str) -> Value {
        let (status, body) = self
            .post("/api/projects", token, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create project: {}", body);
        body
    }

    /// Enroll the token's user through the project's invite code
    pub async fn join(&self, token: &str, project: &Value) {
        let (status, body) = self
            .post(
                "/api/projects/join",
                token,
                serde_json::json!({ "inviteCode": project["inviteCode"] }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "join project: {}", body);
    }

    pub async fn add_song(&self, token: &str, project_id: &str, name: &str) -> Value {
        let (status, body) = self
            .post(
                &format!("/api/projects/{}/songs", project_id),
                token,
                serde_json::json!({ "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add song: {}", body);
        body
    }

    pub async fn add_step(&self, token: &str, project_id: &str, name: &str) -> Value {
        let (status, body) = self
            .post(
                &format!("/api/projects/{}/steps", project_id),
                token,
                serde_json::json!({ "name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "add step: {}", body);
        body
    }

    /// Serve the router on an ephemeral port
    pub async fn spawn(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }
}

/// Extract JSON body from response
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn seed_users(pool: &SqlitePool) {
    let tomorrow = Utc::now() + Duration::days(1);
    for (id, name, token) in [
        ("alice", "Alice", ALICE),
        ("bob", "Bob", BOB),
        ("carol", "Carol", CAROL),
    ] {
        users::upsert_user(pool, id, name, &format!("{}@example.com", id), None)
            .await
            .unwrap();
        users::insert_session(pool, token, id, tomorrow).await.unwrap();
    }
    users::insert_session(pool, EXPIRED, "alice", Utc::now() - Duration::hours(1))
        .await
        .unwrap();
}
