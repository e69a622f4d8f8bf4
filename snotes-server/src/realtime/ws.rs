//! WebSocket endpoint `GET /ws/projects/:projectId`
//!
//! The guard runs before the upgrade, so unauthenticated or non-member
//! callers get a plain HTTP error instead of a socket. Once upgraded the
//! connection is outbound only: every project event is sent as a text frame
//! holding the JSON envelope, and anything the client sends is ignored.

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
    Extension,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::extract::parse_id;
use crate::auth::SessionUser;
use crate::error::ApiResult;
use crate::guard::{self, Access, ProjectScope};
use crate::realtime::Subscription;
use crate::AppState;

/// Close code sent when the server shuts down (1001 "going away")
const CLOSE_GOING_AWAY: u16 = 1001;

/// GET /ws/projects/:projectId
pub async fn project_socket(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(project_id): Path<String>,
    upgrade: WebSocketUpgrade,
) -> ApiResult<Response> {
    let project_id = parse_id(&project_id, "Project")?;
    guard::authorize(&state.db, ProjectScope::Project(project_id), &user.id, Access::Member).await?;

    // Subscribe before the upgrade so nothing published after the handshake is missed
    let subscription = state.hub.subscribe(project_id);
    let shutdown = state.hub.shutdown_token();
    info!(
        "User {} connected to project {} ({} subscribers)",
        user.id,
        project_id,
        state.hub.subscriber_count(project_id)
    );

    Ok(upgrade.on_upgrade(move |socket| serve_socket(socket, subscription, shutdown)))
}

async fn serve_socket(mut socket: WebSocket, mut subscription: Subscription, shutdown: CancellationToken) {
    let project_id = subscription.project_id();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let frame = CloseFrame {
                    code: CLOSE_GOING_AWAY,
                    reason: "server shutting down".into(),
                };
                let _ = socket.send(Message::Close(Some(frame))).await;
                break;
            }

            event = subscription.recv() => {
                let Some(event) = event else { break };
                let text = match event.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to encode {}: {}", event.name(), e);
                        continue;
                    }
                };
                if let Err(e) = socket.send(Message::Text(text)).await {
                    debug!("Send to subscriber of {} failed: {}", project_id, e);
                    break;
                }
            }

            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error on project {}: {}", project_id, e);
                        break;
                    }
                }
            }
        }
    }

    debug!("Subscriber of project {} disconnected", project_id);
}
