//! Endpoint and pacing configuration.
//!
//! Both types here are immutable once built and are shared read-only by
//! every session in a pool.
//!
//! # Example
//!
//! ```ignore
//! use loadswarm::{PacingConfig, ServerEndpoint};
//!
//! let endpoint = ServerEndpoint::new("127.0.0.1", 9090);
//! let pacing = PacingConfig::new().with_max_delay(5);
//! ```

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default upper bound for the randomized inter-message delay, in seconds.
pub const DEFAULT_MAX_DELAY_SECS: u64 = 3;

/// Path the WebSocket upgrade handshake targets.
const WEBSOCKET_PATH: &str = "/connect";

// ============================================================================
// ServerEndpoint
// ============================================================================

/// Target server address, shared read-only by all sessions in a pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    /// Server hostname or IP address.
    host: String,
    /// Server TCP port.
    port: u16,
}

impl ServerEndpoint {
    /// Creates a new endpoint.
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the hostname.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the `host:port` form used for raw socket connects.
    #[inline]
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the HTTP URL for the request/response variant.
    ///
    /// Format: `http://{host}:{port}/`
    #[inline]
    #[must_use]
    pub fn http_url(&self) -> String {
        format!("http://{}:{}/", self.host, self.port)
    }

    /// Returns the WebSocket URL for the upgrade handshake.
    ///
    /// Format: `ws://{host}:{port}/connect`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host does not form a valid URL.
    pub fn ws_url(&self) -> Result<Url> {
        let raw = format!("ws://{}:{}{}", self.host, self.port, WEBSOCKET_PATH);
        Url::parse(&raw).map_err(|e| Error::config(format!("invalid WebSocket URL {raw}: {e}")))
    }
}

impl std::fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ============================================================================
// PacingConfig
// ============================================================================

/// Upper bound for the randomized delay between successive messages.
///
/// A delay of zero is valid; the session then cycles as fast as the
/// network round trip allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingConfig {
    /// Maximum delay in whole seconds, inclusive.
    max_delay_secs: u64,
}

impl PacingConfig {
    /// Creates a pacing configuration with the default bound.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_delay_secs: DEFAULT_MAX_DELAY_SECS,
        }
    }

    /// Sets the maximum delay in seconds.
    #[inline]
    #[must_use]
    pub const fn with_max_delay(mut self, secs: u64) -> Self {
        self.max_delay_secs = secs;
        self
    }

    /// Returns the maximum delay in seconds.
    #[inline]
    #[must_use]
    pub const fn max_delay_secs(&self) -> u64 {
        self.max_delay_secs
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
