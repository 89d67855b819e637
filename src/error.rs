//! Error types for the load simulator.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use loadswarm::{Result, Error};
//!
//! async fn example(transport: &mut dyn Transport) -> Result<()> {
//!     transport.connect().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Fatality
//!
//! Every variant here is fatal to the session that encounters it: the
//! session logs it, closes its connection, and stops. The tolerated
//! per-cycle outcomes (empty response, malformed JSON after cleanup,
//! non-2xx HTTP status) are not errors at all — they are handled inside
//! the session loop and never constructed as [`Error`] values.

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;
use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for the log line that reports it.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when an endpoint or pool configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Connection could not be established.
    ///
    /// Covers DNS failure, refused connection, and connect timeout.
    #[error("Connection failed: {message}")]
    Connect {
        /// Description of the connection error.
        message: String,
    },

    /// Connection closed or never opened when an exchange was attempted.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Blocking read exceeded the fixed read timeout.
    #[error("Read timed out after {timeout_ms}ms")]
    ReadTimeout {
        /// Milliseconds waited before timing out.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error on a socket.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error (request could not complete).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    /// Creates a read timeout error from the elapsed timeout.
    #[inline]
    pub fn read_timeout(timeout: Duration) -> Self {
        Self::ReadTimeout {
            timeout_ms: timeout.as_millis() as u64,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ReadTimeout { .. })
    }

    /// Returns `true` if this is a connection-level error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::ConnectionClosed | Self::Io(_) | Self::WebSocket(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
