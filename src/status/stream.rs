//! Status transport seams
//!
//! The stream client consumes two injected capabilities: a one-shot full
//! snapshot fetch and a duplex stream yielding orchestrator updates. Both
//! live behind traits so tests can script connects, messages and failures;
//! the provided implementations are reqwest and tokio-tungstenite.

use crate::error::{remote_message, ApiError, StreamError};
use crate::status::model::StatusSnapshot;
use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::tungstenite::Message;

/// An open duplex stream of status messages.
#[async_trait]
pub trait StatusStream: Send {
    /// Receive the next message.
    ///
    /// `Ok(Some(bytes))` is a data frame, `Ok(None)` is a non-data frame to
    /// skip (keepalives and the like). `Err` means the connection is gone
    /// and the caller must reconnect.
    async fn receive_one(&mut self) -> Result<Option<Vec<u8>>, StreamError>;
}

/// Capability to open a [`StatusStream`].
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn StatusStream>, StreamError>;
}

/// Capability to fetch the full status snapshot.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    async fn fetch_full(&self) -> Result<StatusSnapshot, ApiError>;
}

/// Reqwest-backed full fetch against `<base>?dataOnly=1`.
pub struct HttpSnapshotFetcher {
    client: reqwest::Client,
    base: String,
}

impl HttpSnapshotFetcher {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into(),
        }
    }
}

#[async_trait]
impl SnapshotFetcher for HttpSnapshotFetcher {
    async fn fetch_full(&self) -> Result<StatusSnapshot, ApiError> {
        let url = format!("{}?dataOnly=1", self.base);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(ApiError::Remote {
                status: status.as_u16(),
                message: remote_message(&body),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

/// WebSocket connector backed by tokio-tungstenite.
pub struct WebSocketConnector;

struct WebSocketStatusStream {
    inner: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
}

#[async_trait]
impl StreamConnector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn StatusStream>, StreamError> {
        let (stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| StreamError::Connect(e.to_string()))?;
        Ok(Box::new(WebSocketStatusStream { inner: stream }))
    }
}

#[async_trait]
impl StatusStream for WebSocketStatusStream {
    async fn receive_one(&mut self) -> Result<Option<Vec<u8>>, StreamError> {
        match self.inner.next().await {
            Some(Ok(Message::Binary(bytes))) => Ok(Some(bytes)),
            Some(Ok(Message::Text(text))) => Ok(Some(text.into_bytes())),
            Some(Ok(Message::Close(_))) => Err(StreamError::Closed),
            Some(Ok(_)) => Ok(None),
            Some(Err(error)) => Err(StreamError::Transport(error.to_string())),
            None => Err(StreamError::Closed),
        }
    }
}
