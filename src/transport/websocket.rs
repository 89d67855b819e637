//! Persistent WebSocket transport.
//!
//! The connection is opened once via an upgrade handshake to `/connect`
//! carrying the client identity in a `device_id` header, then persists
//! for the session's lifetime. Inbound delivery is event-driven: connect
//! splits the stream and spawns a reader task that logs every received
//! frame, while the owning session pushes outbound text frames on its
//! own cadence.
//!
//! Transport errors are fatal to the session, same as the other
//! variants: the reader task logs its error and exits, and the dead
//! connection surfaces as a send failure on the session's next cycle.

// ============================================================================
// Imports
// ============================================================================

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info};

use crate::config::ServerEndpoint;
use crate::error::{Error, Result};
use crate::identity::ClientIdentity;
use crate::transport::{ServerReply, Transport};

use async_trait::async_trait;

// ============================================================================
// Constants
// ============================================================================

/// Header naming the connecting device on the upgrade request.
const DEVICE_ID_HEADER: &str = "device_id";

// ============================================================================
// Types
// ============================================================================

/// Client-side WebSocket stream.
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// WebSocketTransport
// ============================================================================

/// One session's persistent WebSocket connection.
///
/// While connected the transport owns two halves: the write half, driven
/// by the session loop, and a spawned reader task draining the read half.
pub struct WebSocketTransport {
    /// Target endpoint.
    endpoint: ServerEndpoint,
    /// Device id sent in the upgrade handshake and used in log lines.
    device_id: String,
    /// Write half; `None` while disconnected.
    writer: Option<SplitSink<WsStream, Message>>,
    /// Reader task draining inbound frames.
    reader: Option<JoinHandle<()>>,
}

impl WebSocketTransport {
    /// Creates a WebSocket transport for the endpoint and identity.
    #[must_use]
    pub fn new(endpoint: &ServerEndpoint, identity: &ClientIdentity) -> Self {
        Self {
            endpoint: endpoint.clone(),
            device_id: identity.id().to_owned(),
            writer: None,
            reader: None,
        }
    }

    /// Drains inbound frames, logging each one verbatim.
    ///
    /// Runs as the session's second unit of concurrency. Ends when the
    /// peer closes or the connection errors; the broken connection then
    /// fails the session's next send.
    async fn read_loop(mut read: SplitStream<WsStream>, device_id: String) {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    info!(client = %device_id, message = %text.as_str(), "message received");
                }
                Ok(Message::Close(_)) => {
                    debug!(client = %device_id, "websocket closed by server");
                    break;
                }
                Ok(_) => {} // binary, ping, pong
                Err(e) => {
                    error!(client = %device_id, error = %e, "websocket error");
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&mut self) -> Result<()> {
        let url = self.endpoint.ws_url()?;

        let mut request = url.as_str().into_client_request()?;
        let device_id = HeaderValue::from_str(&self.device_id)
            .map_err(|e| Error::config(format!("invalid device id: {e}")))?;
        request.headers_mut().insert(DEVICE_ID_HEADER, device_id);

        debug!(client = %self.device_id, url = %url, "connecting websocket");

        let (stream, _response) = connect_async(request)
            .await
            .map_err(|e| Error::connect(format!("{url}: {e}")))?;

        info!(client = %self.device_id, "websocket connected");

        let (writer, reader) = stream.split();
        self.writer = Some(writer);
        self.reader = Some(tokio::spawn(Self::read_loop(
            reader,
            self.device_id.clone(),
        )));

        Ok(())
    }

    async fn send(&mut self, payload: &str) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(Error::ConnectionClosed)?;
        writer.send(Message::Text(payload.into())).await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<ServerReply> {
        // Inbound frames are handled by the reader task.
        Ok(ServerReply::Detached)
    }

    async fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            debug!(client = %self.device_id, "closing websocket");
            let _ = writer.close().await;
        }

        if let Some(reader) = self.reader.take() {
            // The reader may be parked on a dead peer; don't wait for it.
            reader.abort();
        }
    }

    fn is_connected(&self) -> bool {
        self.writer.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
