//! Client Sync Agent
//!
//! One agent per open project view:
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//!       ^                          |
//!       +---- (close / error) -----+
//!       |
//!       +-> Connecting again after `reconnect_delay`
//! ```
//!
//! Every event marks the cached snapshot stale; `note-added` also marks note
//! threads stale. Reconnecting marks the snapshot stale too, since events
//! published while disconnected are never replayed. Shutting down cancels a
//! pending reconnect and closes an open connection; nothing touches the cache
//! afterwards.
//!
//! [`SyncAgent::start`] pairs the agent with a [`Refresher`], so invalidated
//! entries are refetched without further setup.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use snotes_common::ProjectEvent;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api_client::ApiClient;
use crate::cache::{ProjectCache, Refresher};
use crate::error::Result;
use crate::transport::{Connection, Connector, WsConnector};

/// Delay between a lost connection and the next attempt
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Client settings
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Server root, e.g. `http://localhost:3000`
    pub base_url: String,
    pub session_token: String,
    pub reconnect_delay: Duration,
}

impl SyncConfig {
    pub fn new(base_url: impl Into<String>, session_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session_token: session_token.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

/// Connection state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Disconnected,
    Connecting,
    Connected,
}

/// Envelope fields needed to react to events this build does not know
#[derive(Deserialize)]
struct Envelope {
    event: String,
}

/// What an incoming payload asks the cache to do
#[derive(Debug, PartialEq, Eq)]
enum Reaction {
    Invalidate { notes: bool },
    Discard,
}

fn react(payload: &str) -> Reaction {
    match ProjectEvent::from_json(payload) {
        Ok(event) => {
            debug!("Received {}", event.name());
            Reaction::Invalidate {
                notes: event.invalidates_notes(),
            }
        }
        Err(e) => match serde_json::from_str::<Envelope>(payload) {
            Ok(envelope) => {
                warn!("Unrecognized event {:?} ({}), refetching anyway", envelope.event, e);
                Reaction::Invalidate {
                    notes: envelope.event == "note-added",
                }
            }
            Err(_) => {
                warn!("Discarding malformed channel message: {}", e);
                Reaction::Discard
            }
        },
    }
}

/// Spawns agents
pub struct SyncAgent;

impl SyncAgent {
    /// Start syncing `cache` over WebSocket with the settings in `config`
    ///
    /// Also runs a [`Refresher`] that refetches whatever the agent marks
    /// stale; it stops together with the agent.
    pub fn start(config: &SyncConfig, cache: Arc<ProjectCache>) -> Result<SyncHandle> {
        let api = ApiClient::new(config.base_url.clone(), config.session_token.clone())?;
        let refresher = Refresher::new(api.clone(), cache.clone());
        let mut handle = Self::spawn(
            Arc::new(WsConnector::new(api)),
            cache,
            config.reconnect_delay,
        );
        handle.refresher = Some(refresher.spawn(handle.cancel.clone()));
        Ok(handle)
    }

    /// Start syncing `cache` with the project's channel
    pub fn spawn(
        connector: Arc<dyn Connector>,
        cache: Arc<ProjectCache>,
        reconnect_delay: Duration,
    ) -> SyncHandle {
        let (state_tx, state_rx) = watch::channel(SyncState::Disconnected);
        let cancel = CancellationToken::new();

        let worker = Worker {
            project_id: cache.project_id(),
            connector,
            cache,
            reconnect_delay,
            state: state_tx,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(worker.run());

        SyncHandle {
            state: state_rx,
            cancel,
            task: Some(task),
            refresher: None,
        }
    }
}

/// Control handle of a running agent
///
/// Dropping the handle tears the agent down like [`SyncHandle::shutdown`]
/// without waiting for it.
pub struct SyncHandle {
    state: watch::Receiver<SyncState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    refresher: Option<JoinHandle<()>>,
}

impl SyncHandle {
    pub fn state(&self) -> SyncState {
        *self.state.borrow()
    }

    /// Receiver following every state change
    pub fn watch_state(&self) -> watch::Receiver<SyncState> {
        self.state.clone()
    }

    /// Wait until the agent reaches `target`
    pub async fn wait_for(&self, target: SyncState) {
        let mut state = self.state.clone();
        let _ = state.wait_for(|s| *s == target).await;
    }

    /// Stop the agent and wait for it to finish
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for task in [self.task.take(), self.refresher.take()].into_iter().flatten() {
            if let Err(e) = task.await {
                warn!("Sync agent task failed: {}", e);
            }
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Worker {
    project_id: Uuid,
    connector: Arc<dyn Connector>,
    cache: Arc<ProjectCache>,
    reconnect_delay: Duration,
    state: watch::Sender<SyncState>,
    cancel: CancellationToken,
}

impl Worker {
    fn set_state(&self, state: SyncState) {
        self.state.send_replace(state);
    }

    async fn run(self) {
        let mut connected_before = false;

        loop {
            self.set_state(SyncState::Connecting);
            let attempt = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                attempt = self.connector.connect(self.project_id) => attempt,
            };

            match attempt {
                Ok(mut connection) => {
                    if self.cancel.is_cancelled() {
                        connection.close().await;
                        break;
                    }
                    info!("Connected to project {}", self.project_id);
                    self.set_state(SyncState::Connected);
                    if connected_before {
                        // Events published while offline are gone
                        self.cache.invalidate_project();
                    }
                    connected_before = true;

                    if self.pump(connection).await.is_break() {
                        break;
                    }
                }
                Err(e) => warn!("Connection to project {} failed: {}", self.project_id, e),
            }

            self.set_state(SyncState::Disconnected);
            info!(
                "Disconnected from project {}, reconnecting in {:?}",
                self.project_id, self.reconnect_delay
            );

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        self.set_state(SyncState::Disconnected);
        debug!("Sync agent for project {} stopped", self.project_id);
    }

    /// Feed messages into the cache until the connection ends
    ///
    /// Breaks when the agent was cancelled.
    async fn pump(&self, mut connection: Box<dyn Connection>) -> std::ops::ControlFlow<()> {
        use std::ops::ControlFlow;

        loop {
            let message = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    connection.close().await;
                    return ControlFlow::Break(());
                }
                message = connection.next_message() => message,
            };

            match message {
                Some(Ok(payload)) => match react(&payload) {
                    Reaction::Invalidate { notes } => {
                        self.cache.invalidate_project();
                        if notes {
                            self.cache.invalidate_notes();
                        }
                    }
                    Reaction::Discard => {}
                },
                Some(Err(e)) => {
                    warn!("Channel error on project {}: {}", self.project_id, e);
                    connection.close().await;
                    return ControlFlow::Continue(());
                }
                None => return ControlFlow::Continue(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_events() {
        let id = Uuid::new_v4();
        let payload = format!(r#"{{"event":"song-deleted","data":{{"songId":"{}"}}}}"#, id);
        assert_eq!(react(&payload), Reaction::Invalidate { notes: false });
    }

    #[test]
    fn test_unknown_event_still_invalidates() {
        let payload = r#"{"event":"project-renamed","data":{"name":"x"}}"#;
        assert_eq!(react(payload), Reaction::Invalidate { notes: false });

        let payload = r#"{"event":"note-added","data":{"note":"truncated"}}"#;
        assert_eq!(react(payload), Reaction::Invalidate { notes: true });
    }

    #[test]
    fn test_malformed_payload_discarded() {
        assert_eq!(react("not json"), Reaction::Discard);
        assert_eq!(react(r#"{"data":{}}"#), Reaction::Discard);
        assert_eq!(react("[1,2,3]"), Reaction::Discard);
    }

    #[test]
    fn test_config_defaults() {
        let config = SyncConfig::new("http://localhost:3000", "tok");
        assert_eq!(config.reconnect_delay, Duration::from_secs(3));
        let config = config.with_reconnect_delay(Duration::from_millis(10));
        assert_eq!(config.reconnect_delay, Duration::from_millis(10));
    }
}
