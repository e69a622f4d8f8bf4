//! # Session Notes Sync Client
//!
//! Client side of the real-time layer:
//! - [`ApiClient`]: typed wrapper over every HTTP operation
//! - [`ProjectCache`]: project snapshot and note threads with stale tracking
//! - [`SyncAgent`]: reconnecting WebSocket subscriber that invalidates the cache
//! - [`Refresher`]: refetches whatever the cache reports stale
//!
//! Events are never applied as deltas. They only mark cached data stale; the
//! authoritative state always comes from a refetch.

pub mod agent;
pub mod api_client;
pub mod cache;
pub mod error;
pub mod mutations;
pub mod transport;

pub use agent::{SyncAgent, SyncConfig, SyncHandle, SyncState, DEFAULT_RECONNECT_DELAY};
pub use api_client::ApiClient;
pub use cache::{ProjectCache, Refresher};
pub use error::{Result, SyncError};
pub use transport::{Connection, Connector, WsConnector};
