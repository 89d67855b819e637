//! Persistent raw TCP socket transport.
//!
//! The connection is opened once and persists across messages. Each
//! cycle writes one JSON-serialized command, then blocks on a read with
//! a fixed 2-second timeout into a bounded buffer. A zero-byte read
//! (peer closed) is a recognized reply, not an error; a read timeout or
//! any socket error is fatal to the session.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use crate::config::ServerEndpoint;
use crate::error::{Error, Result};
use crate::transport::{ServerReply, Transport};

use async_trait::async_trait;

// ============================================================================
// Constants
// ============================================================================

/// Fixed blocking-read timeout per receive.
const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Ceiling on a single response read (1 MiB).
const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

// ============================================================================
// SocketTransport
// ============================================================================

/// One session's persistent TCP connection.
pub struct SocketTransport {
    /// Target `host:port`.
    addr: String,
    /// Live connection; `None` while disconnected.
    stream: Option<TcpStream>,
    /// Reusable receive buffer, sized on connect.
    read_buf: Vec<u8>,
}

impl SocketTransport {
    /// Creates a socket transport for the endpoint.
    #[must_use]
    pub fn new(endpoint: &ServerEndpoint) -> Self {
        Self {
            addr: endpoint.addr(),
            stream: None,
            read_buf: Vec::new(),
        }
    }
}

#[async_trait]
impl Transport for SocketTransport {
    async fn connect(&mut self) -> Result<()> {
        debug!(addr = %self.addr, "opening socket to server");

        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| Error::connect(format!("{}: {e}", self.addr)))?;

        self.stream = Some(stream);
        if self.read_buf.len() != MAX_RESPONSE_BYTES {
            self.read_buf = vec![0; MAX_RESPONSE_BYTES];
        }

        Ok(())
    }

    async fn send(&mut self, payload: &str) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;
        stream.write_all(payload.as_bytes()).await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<ServerReply> {
        let stream = self.stream.as_mut().ok_or(Error::ConnectionClosed)?;

        match timeout(READ_TIMEOUT, stream.read(&mut self.read_buf)).await {
            Ok(Ok(n)) => Ok(ServerReply::Bytes(self.read_buf[..n].to_vec())),
            Ok(Err(e)) => Err(Error::Io(e)),
            Err(_) => Err(Error::read_timeout(READ_TIMEOUT)),
        }
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!(addr = %self.addr, "closing socket");
            let _ = stream.shutdown().await;
        }
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;

    use crate::identity::ClientIdentity;
    use crate::protocol::{CommandMessage, DeviceCommand};

    async fn local_endpoint() -> (TcpListener, ServerEndpoint) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        (listener, ServerEndpoint::new("127.0.0.1", port))
    }

    #[tokio::test]
    async fn test_json_exchange() {
        let (listener, endpoint) = local_endpoint().await;

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut buf = vec![0u8; 4096];
            let n = stream.read(&mut buf).await.expect("read");

            // The request must already be valid JSON on the wire.
            let request: CommandMessage =
                serde_json::from_slice(&buf[..n]).expect("request decodes");
            let reply = format!("{{\"Echo\":\"{}\"}}", request.body);
            stream.write_all(reply.as_bytes()).await.expect("write");
        });

        let identity = ClientIdentity::indexed("sockets client", 0);
        let message = CommandMessage::new(&identity, DeviceCommand::OpenDoor, 1706000000);

        let mut transport = SocketTransport::new(&endpoint);
        transport.connect().await.expect("connect");
        assert!(transport.is_connected());

        transport
            .send(&message.to_json().expect("serialize"))
            .await
            .expect("send");

        let reply = transport.receive().await.expect("receive");
        assert_eq!(reply, ServerReply::Bytes(b"{\"Echo\":\"open-door\"}".to_vec()));
    }

    #[tokio::test]
    async fn test_peer_close_yields_empty_reply() {
        let (listener, endpoint) = local_endpoint().await;

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.expect("accept");
            let mut buf = vec![0u8; 1024];
            let _ = stream.read(&mut buf).await;
            // Close without answering.
            drop(stream);
        });

        let mut transport = SocketTransport::new(&endpoint);
        transport.connect().await.expect("connect");
        transport.send("{}").await.expect("send");

        let reply = transport.receive().await.expect("receive");
        assert_eq!(reply, ServerReply::Bytes(Vec::new()));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let (listener, endpoint) = local_endpoint().await;

        // Accept and hold the connection open without ever replying.
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.expect("accept");
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let mut transport = SocketTransport::new(&endpoint);
        transport.connect().await.expect("connect");
        transport.send("{}").await.expect("send");

        let err = transport.receive().await.expect_err("must time out");
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_connect_refused_is_fatal() {
        let (listener, endpoint) = local_endpoint().await;
        drop(listener);

        let mut transport = SocketTransport::new(&endpoint);
        let err = transport.connect().await.expect_err("must fail");
        assert!(err.is_connection_error());
        assert!(!transport.is_connected());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let endpoint = ServerEndpoint::new("127.0.0.1", 9999);
        let mut transport = SocketTransport::new(&endpoint);
        transport.close().await;
        transport.close().await;
        assert!(!transport.is_connected());
    }
}
