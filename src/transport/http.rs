//! HTTP request/response transport.
//!
//! There is no persistent connection in this variant: each cycle issues
//! one POST with the fixed `PING` body and a fresh connection (idle
//! connection reuse is disabled on the client), then reads the full
//! response. A non-2xx status is a valid reply, not an error; any
//! transport-level failure is fatal to the session.
//!
//! The round trip deliberately carries no request timeout. A hung server
//! blocks the session until the peer or the OS gives up; that matches
//! the simulator's accepted behavior.

// ============================================================================
// Imports
// ============================================================================

use reqwest::Client;
use tracing::debug;

use crate::config::ServerEndpoint;
use crate::error::{Error, Result};
use crate::transport::{ServerReply, Transport};

use async_trait::async_trait;

// ============================================================================
// HttpTransport
// ============================================================================

/// One session's HTTP exchange channel.
pub struct HttpTransport {
    /// Target URL, `http://{host}:{port}/`.
    url: String,
    /// Prepared client; `None` until `connect`.
    client: Option<Client>,
    /// In-flight response between `send` and `receive`.
    pending: Option<reqwest::Response>,
}

impl HttpTransport {
    /// Creates an HTTP transport for the endpoint.
    #[must_use]
    pub fn new(endpoint: &ServerEndpoint) -> Self {
        Self {
            url: endpoint.http_url(),
            client: None,
            pending: None,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.client.is_none() {
            // Idle reuse off: every cycle's POST opens a fresh connection.
            let client = Client::builder()
                .pool_max_idle_per_host(0)
                .build()
                .map_err(|e| Error::connect(format!("building HTTP client: {e}")))?;

            debug!(url = %self.url, "HTTP client ready");
            self.client = Some(client);
        }

        Ok(())
    }

    async fn send(&mut self, payload: &str) -> Result<()> {
        let client = self.client.as_ref().ok_or(Error::ConnectionClosed)?;

        let response = client.post(&self.url).body(payload.to_owned()).send().await?;
        self.pending = Some(response);

        Ok(())
    }

    async fn receive(&mut self) -> Result<ServerReply> {
        let response = self.pending.take().ok_or(Error::ConnectionClosed)?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ServerReply::Http { status, body })
    }

    async fn close(&mut self) {
        self.client = None;
        self.pending = None;
    }

    fn is_connected(&self) -> bool {
        self.client.is_some()
    }
}

// ============================================================================
// Tests
// ============================================================================
