//! snotes-server library - collaborative checklist API with real-time sync
//!
//! Routes are split into a public router (`/health`) and a protected router
//! (`/api/...`, `/ws/...`) behind the session middleware.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod guard;
pub mod realtime;

use auth::SessionValidator;
use realtime::{ChannelHub, EventPublisher};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Relational store
    pub db: SqlitePool,
    /// Where committed mutations publish their event
    pub events: Arc<dyn EventPublisher>,
    /// Per-project channels served over WebSocket
    pub hub: ChannelHub,
    /// Auth provider bridge
    pub sessions: Arc<dyn SessionValidator>,
}

impl AppState {
    /// Create state whose events fan out through `hub`
    pub fn new(db: SqlitePool, hub: ChannelHub, sessions: Arc<dyn SessionValidator>) -> Self {
        Self {
            db,
            events: Arc::new(hub.clone()),
            hub,
            sessions,
        }
    }

    /// Replace the event sink
    pub fn with_publisher(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = events;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, patch, post};

    // Protected routes (require a session)
    let protected = Router::new()
        .route(
            "/api/projects",
            get(api::projects::list_projects).post(api::projects::create_project),
        )
        .route("/api/projects/join", post(api::projects::join_project))
        .route(
            "/api/projects/:id",
            get(api::projects::get_project).delete(api::projects::delete_project),
        )
        .route("/api/projects/:id/songs", post(api::songs::add_song))
        .route("/api/projects/:id/steps", post(api::steps::add_step))
        .route(
            "/api/songs/:id",
            patch(api::songs::update_song).delete(api::songs::delete_song),
        )
        .route(
            "/api/steps/:id",
            patch(api::steps::update_step).delete(api::steps::delete_step),
        )
        .route("/api/cells/:id", patch(api::cells::toggle_cell))
        .route(
            "/api/cells/:id/notes",
            get(api::notes::list_notes).post(api::notes::add_note),
        )
        .route("/ws/projects/:id", get(realtime::ws::project_socket))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    // Public routes (no session)
    let public = Router::new().merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy: permissive when no origins are configured
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
