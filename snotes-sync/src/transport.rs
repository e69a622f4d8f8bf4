//! Channel transport
//!
//! The agent talks to the server through [`Connector`] so the state machine
//! can run against any message source. [`WsConnector`] is the real one.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use uuid::Uuid;

use crate::api_client::ApiClient;
use crate::error::{Result, SyncError};

/// An open, receive-only channel connection
#[async_trait]
pub trait Connection: Send {
    /// Next text payload
    ///
    /// `None` once the server closed the connection; `Some(Err)` on a
    /// transport failure, after which the connection is unusable.
    async fn next_message(&mut self) -> Option<Result<String>>;

    /// Close the connection; further calls are no-ops
    async fn close(&mut self);
}

/// Opens connections to project channels
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, project_id: Uuid) -> Result<Box<dyn Connection>>;
}

/// WebSocket connector presenting the session token as a bearer header
#[derive(Debug, Clone)]
pub struct WsConnector {
    api: ApiClient,
}

impl WsConnector {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, project_id: Uuid) -> Result<Box<dyn Connection>> {
        let url = self.api.socket_url(project_id);
        let mut request = url.as_str().into_client_request()?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api.session_token()))
            .map_err(|e| SyncError::Config(format!("session token is not a valid header: {}", e)))?;
        request.headers_mut().insert("Authorization", bearer);

        let (stream, _) = connect_async(request).await?;
        debug!("Opened channel {}", url);
        Ok(Box::new(WsConnection {
            stream: Some(stream),
        }))
    }
}

struct WsConnection {
    stream: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

#[async_trait]
impl Connection for WsConnection {
    async fn next_message(&mut self) -> Option<Result<String>> {
        let stream = self.stream.as_mut()?;
        loop {
            match stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(bytes)) => {
                    return Some(Ok(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Ok(Message::Close(frame)) => {
                    debug!("Server closed channel: {:?}", frame);
                    self.stream = None;
                    return None;
                }
                Ok(_) => continue,
                Err(e) => {
                    self.stream = None;
                    return Some(Err(e.into()));
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.close(None).await;
        }
    }
}
