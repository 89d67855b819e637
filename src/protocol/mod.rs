//! Wire message types.
//!
//! Defines the payloads exchanged with the server on each transport
//! variant and the defensive cleanup applied to raw socket responses
//! before JSON decoding.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Outbound command messages and the HTTP ping literal |
//! | `cleanup` | Raw response cleanup and JSON decoding |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound command messages.
pub mod message;

/// Raw response cleanup and decoding.
pub mod cleanup;

// ============================================================================
// Re-exports
// ============================================================================

pub use cleanup::{clean_payload, decode_payload};
pub use message::{CommandMessage, DeviceCommand, PING};
