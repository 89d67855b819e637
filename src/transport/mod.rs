//! Transport layer.
//!
//! One [`Transport`] implementation per connection style:
//!
//! | Module | Style |
//! |--------|-------|
//! | `http` | one fresh connection and POST per message |
//! | `socket` | one persistent TCP connection, JSON request/response |
//! | `websocket` | one persistent upgraded connection, paced text frames |
//!
//! # Contract
//!
//! A transport encapsulates exactly one connection lifecycle: connect,
//! send, receive, close. Each instance is exclusively owned by one
//! session; a session holds at most one open connection at a time.
//! Every error a transport returns is fatal to the owning session —
//! tolerated outcomes (empty payload, non-2xx status) are ordinary
//! [`ServerReply`] values, not errors.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;

use crate::config::ServerEndpoint;
use crate::error::Result;
use crate::identity::ClientIdentity;

// ============================================================================
// Submodules
// ============================================================================

/// HTTP request/response transport.
pub mod http;

/// Persistent raw TCP socket transport.
pub mod socket;

/// Persistent WebSocket transport.
pub mod websocket;

// ============================================================================
// Re-exports
// ============================================================================

pub use http::HttpTransport;
pub use socket::SocketTransport;
pub use websocket::WebSocketTransport;

// ============================================================================
// ServerReply
// ============================================================================

/// What came back from the server for one sent message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerReply {
    /// Full HTTP response. Any status code is a valid reply.
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, treated as opaque text.
        body: String,
    },

    /// Raw bytes read from the socket; empty when the peer closed.
    Bytes(Vec<u8>),

    /// Delivery is handled by the transport's own reader task; there is
    /// nothing to collect in the request cycle.
    Detached,
}

// ============================================================================
// Transport Trait
// ============================================================================

/// One connection lifecycle: connect, send, receive, close.
#[async_trait]
pub trait Transport: Send {
    /// Establishes the connection.
    ///
    /// The HTTP variant has no persistent connection; its `connect` only
    /// prepares the client, and each send opens a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`](crate::Error::Connect) (or the
    /// underlying transport error) on DNS failure, refused connection,
    /// or handshake failure. Fatal to the session.
    async fn connect(&mut self) -> Result<()>;

    /// Sends one prepared payload.
    ///
    /// # Errors
    ///
    /// Any error is fatal to the session.
    async fn send(&mut self, payload: &str) -> Result<()>;

    /// Collects the server's reply to the last sent payload.
    ///
    /// # Errors
    ///
    /// Transport-level failures (socket errors, read timeout) are fatal.
    /// An empty reply is not an error; it comes back as
    /// [`ServerReply::Bytes`] with no bytes.
    async fn receive(&mut self) -> Result<ServerReply>;

    /// Closes the connection. Safe to call when already closed.
    async fn close(&mut self);

    /// Returns `true` while the transport holds a usable connection.
    fn is_connected(&self) -> bool;
}

// ============================================================================
// TransportKind
// ============================================================================

/// Selects which transport a session runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// HTTP request per message.
    Http,
    /// Persistent raw TCP socket.
    Socket,
    /// Persistent WebSocket connection.
    WebSocket,
}

impl TransportKind {
    /// Builds a transport of this kind for one session.
    #[must_use]
    pub fn build(
        self,
        endpoint: &ServerEndpoint,
        identity: &ClientIdentity,
    ) -> Box<dyn Transport> {
        match self {
            Self::Http => Box::new(HttpTransport::new(endpoint)),
            Self::Socket => Box::new(SocketTransport::new(endpoint)),
            Self::WebSocket => Box::new(WebSocketTransport::new(endpoint, identity)),
        }
    }

    /// Human-readable client name for sessions of this kind.
    #[inline]
    #[must_use]
    pub const fn client_name(self) -> &'static str {
        match self {
            Self::Http => "ping pong client",
            Self::Socket => "sockets client",
            Self::WebSocket => "websockets client",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Http => "http",
            Self::Socket => "socket",
            Self::WebSocket => "websocket",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Tests
// ============================================================================
