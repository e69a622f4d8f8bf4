//! Error types for snotes-sync

use thiserror::Error;

/// Sync client error type
#[derive(Debug, Error)]
pub enum SyncError {
    /// Request never produced a response
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with an error status
    #[error("API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// WebSocket could not be opened or failed mid-stream
    #[error("Transport error: {0}")]
    Transport(String),

    /// Payload did not match the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Client misconfiguration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Api { status, .. } => Some(*status),
            SyncError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SyncError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        SyncError::Transport(err.to_string())
    }
}

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;
