//! Per-project channel manager and broadcaster
//!
//! A channel exists only while it has at least one subscriber. Publishing to
//! a project nobody watches is a no-op. Delivery is at-most-once: a subscriber
//! that falls more than `capacity` events behind skips the missed events and
//! recovers by refetching the project.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use snotes_common::ProjectEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Sink for events produced by successful mutations
pub trait EventPublisher: Send + Sync {
    /// Deliver `event` to the current subscribers of `project_id`
    ///
    /// Returns the number of subscribers reached. Never fails the caller.
    fn publish(&self, project_id: Uuid, event: ProjectEvent) -> usize;
}

struct HubInner {
    channels: RwLock<HashMap<Uuid, broadcast::Sender<Arc<ProjectEvent>>>>,
    capacity: usize,
    shutdown: CancellationToken,
}

/// Registry of per-project broadcast channels
#[derive(Clone)]
pub struct ChannelHub {
    inner: Arc<HubInner>,
}

impl ChannelHub {
    /// Create a hub whose channels buffer `capacity` events per project
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        info!("Channel hub initialized with capacity {}", capacity);
        Self {
            inner: Arc::new(HubInner {
                channels: RwLock::new(HashMap::new()),
                capacity,
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Join the project's channel, creating it for the first subscriber
    pub fn subscribe(&self, project_id: Uuid) -> Subscription {
        let mut channels = self
            .inner
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let rx = match channels.get(&project_id) {
            Some(tx) => tx.subscribe(),
            None => {
                let (tx, rx) = broadcast::channel(self.inner.capacity);
                channels.insert(project_id, tx);
                debug!("Opened channel for project {}", project_id);
                rx
            }
        };

        Subscription {
            project_id,
            rx: Some(rx),
            hub: self.clone(),
        }
    }

    /// Live subscribers of one project
    pub fn subscriber_count(&self, project_id: Uuid) -> usize {
        self.inner
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&project_id)
            .map_or(0, |tx| tx.receiver_count())
    }

    /// Projects that currently have a channel
    pub fn channel_count(&self) -> usize {
        self.inner
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Signal every open connection to close
    pub fn shutdown(&self) {
        info!("Channel hub shutting down");
        self.inner.shutdown.cancel();
    }

    /// Token cancelled by [`ChannelHub::shutdown`]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    /// Drop the project's channel once its last receiver is gone
    fn release(&self, project_id: Uuid) {
        let mut channels = self
            .inner
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if channels
            .get(&project_id)
            .is_some_and(|tx| tx.receiver_count() == 0)
        {
            channels.remove(&project_id);
            debug!("Closed channel for project {}", project_id);
        }
    }
}

impl EventPublisher for ChannelHub {
    fn publish(&self, project_id: Uuid, event: ProjectEvent) -> usize {
        let channels = self
            .inner
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(tx) = channels.get(&project_id) else {
            debug!("No subscribers for project {}, dropping {}", project_id, event.name());
            return 0;
        };

        let name = event.name();
        match tx.send(Arc::new(event)) {
            Ok(count) => {
                debug!("Broadcast {} to {} subscribers of {}", name, count, project_id);
                count
            }
            Err(_) => 0,
        }
    }
}

/// One receiver on a project channel
///
/// Dropping it unsubscribes and closes the channel when it was the last one.
pub struct Subscription {
    project_id: Uuid,
    rx: Option<broadcast::Receiver<Arc<ProjectEvent>>>,
    hub: ChannelHub,
}

impl Subscription {
    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    /// Next event, or `None` once the channel is closed
    ///
    /// Lagging skips the overwritten events with a warning.
    pub async fn recv(&mut self) -> Option<Arc<ProjectEvent>> {
        let rx = self.rx.as_mut()?;
        loop {
            match rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        "Subscriber of project {} lagged, skipped {} events",
                        self.project_id, skipped
                    );
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        // The receiver must be gone before release counts them
        drop(self.rx.take());
        self.hub.release(self.project_id);
    }
}
