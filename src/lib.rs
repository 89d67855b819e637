//! Loadswarm - Multi-protocol synthetic client load simulator.
//!
//! This library spins up a configurable pool of concurrent synthetic
//! clients, each repeatedly exchanging short request/response messages
//! with a remote server over one of three transports, with randomized
//! inter-message pacing to emulate organic traffic.
//!
//! # Architecture
//!
//! - Each [`ClientSession`] owns: one connection + one pacer + one loop
//! - Sessions run truly concurrently, one tokio task each (WebSocket
//!   sessions add a second task for inbound frames)
//! - The [`ClientPool`] registers every session before starting it and
//!   coordinates graceful shutdown from a single external signal
//! - Per-cycle errors never escape a session; only startup argument
//!   errors are process-fatal
//!
//! # Quick Start
//!
//! ```no_run
//! use loadswarm::{ClientPool, PacingConfig, ServerEndpoint, TransportKind};
//!
//! #[tokio::main]
//! async fn main() {
//!     let endpoint = ServerEndpoint::new("127.0.0.1", 9090);
//!     let pacing = PacingConfig::new().with_max_delay(5);
//!
//!     // Ten persistent socket clients exchanging JSON commands
//!     let mut pool = ClientPool::spawn(TransportKind::Socket, &endpoint, pacing, 10);
//!
//!     tokio::signal::ctrl_c().await.ok();
//!     pool.shutdown_all();
//!     pool.join_all().await;
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | [`ServerEndpoint`] and [`PacingConfig`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identity`] | Stable per-session [`ClientIdentity`] |
//! | [`pacing`] | Randomized inter-message delay |
//! | [`pool`] | Concurrent session pool and coordinated shutdown |
//! | [`protocol`] | Wire message types and response cleanup |
//! | [`session`] | Per-client session loop and state machine |
//! | [`transport`] | HTTP / socket / WebSocket connection lifecycles |

// ============================================================================
// Modules
// ============================================================================

/// Endpoint and pacing configuration.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Stable per-session client identity.
pub mod identity;

/// Randomized inter-message pacing.
pub mod pacing;

/// Concurrent session pool and coordinated shutdown.
pub mod pool;

/// Wire message types.
pub mod protocol;

/// Per-client session loop and state machine.
pub mod session;

/// Transport connection lifecycles.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration types
pub use config::{DEFAULT_MAX_DELAY_SECS, PacingConfig, ServerEndpoint};

// Error types
pub use error::{Error, Result};

// Identity
pub use identity::ClientIdentity;

// Pacing
pub use pacing::Pacer;

// Pool and session types
pub use pool::ClientPool;
pub use session::{ClientSession, SessionHandle, SessionState};

// Protocol types
pub use protocol::{CommandMessage, DeviceCommand, PING};

// Transport types
pub use transport::{ServerReply, Transport, TransportKind};
