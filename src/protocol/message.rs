//! Outbound message types.
//!
//! The socket and WebSocket variants exchange a structured JSON record
//! with PascalCase field names:
//!
//! ```json
//! {"Sender":"sockets client-socket_0","Body":"open-door","Time":1706000000}
//! ```
//!
//! The HTTP variant sends the fixed [`PING`] literal instead.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identity::ClientIdentity;

// ============================================================================
// Constants
// ============================================================================

/// Fixed request body for the HTTP variant.
pub const PING: &str = "PING";

// ============================================================================
// DeviceCommand
// ============================================================================

/// The closed set of command bodies a synthetic client may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceCommand {
    /// Ask the device to open a door.
    OpenDoor,
    /// Ask the device to switch a light on.
    OpenLight,
    /// Ask the device to activate everything at once.
    ActivateAll,
}

impl DeviceCommand {
    /// All command bodies, in wire order.
    pub const ALL: [Self; 3] = [Self::OpenDoor, Self::OpenLight, Self::ActivateAll];

    /// Picks a body uniformly at random.
    #[must_use]
    pub fn choose<R: Rng + ?Sized>(rng: &mut R) -> Self {
        *Self::ALL.choose(rng).unwrap_or(&Self::OpenDoor)
    }

    /// Returns the wire representation.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenDoor => "open-door",
            Self::OpenLight => "open-light",
            Self::ActivateAll => "activate-all",
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// CommandMessage
// ============================================================================

/// One outbound command record.
///
/// Serialized as JSON text with PascalCase field names; `Time` is unix
/// seconds at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommandMessage {
    /// Sending client, `{name}-{id}`.
    pub sender: String,
    /// Command body.
    pub body: DeviceCommand,
    /// Construction timestamp, unix seconds.
    pub time: u64,
}

impl CommandMessage {
    /// Creates a message with an explicit timestamp.
    #[inline]
    #[must_use]
    pub fn new(identity: &ClientIdentity, body: DeviceCommand, time: u64) -> Self {
        Self {
            sender: identity.sender(),
            body,
            time,
        }
    }

    /// Creates a message stamped with the current unix time.
    #[inline]
    #[must_use]
    pub fn now(identity: &ClientIdentity, body: DeviceCommand) -> Self {
        Self::new(identity, body, unix_now())
    }

    /// Serializes the message to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Current unix time in whole seconds.
fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn identity() -> ClientIdentity {
        ClientIdentity::indexed("sockets client", 0)
    }

    #[test]
    fn test_body_wire_names() {
        assert_eq!(DeviceCommand::OpenDoor.as_str(), "open-door");
        assert_eq!(DeviceCommand::OpenLight.as_str(), "open-light");
        assert_eq!(DeviceCommand::ActivateAll.as_str(), "activate-all");
    }

    #[test]
    fn test_serialized_field_names() {
        let message = CommandMessage::new(&identity(), DeviceCommand::OpenDoor, 1706000000);
        let json = message.to_json().expect("serialize");

        assert!(json.contains("\"Body\":\"open-door\""));
        assert!(json.contains("\"Sender\":\"sockets client-socket_0\""));
        assert!(json.contains("\"Time\":1706000000"));
    }

    #[test]
    fn test_time_is_construction_timestamp() {
        let message = CommandMessage::new(&identity(), DeviceCommand::OpenLight, 42);
        assert_eq!(message.time, 42);
    }

    #[test]
    fn test_now_uses_current_time() {
        let before = unix_now();
        let message = CommandMessage::now(&identity(), DeviceCommand::OpenDoor);
        let after = unix_now();
        assert!(message.time >= before && message.time <= after);
    }

    #[test]
    fn test_choose_stays_in_body_set() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..64 {
            let body = DeviceCommand::choose(&mut rng);
            assert!(DeviceCommand::ALL.contains(&body));
        }
    }

    #[test]
    fn test_choose_is_deterministic_with_seed() {
        let mut a = ChaCha8Rng::seed_from_u64(99);
        let mut b = ChaCha8Rng::seed_from_u64(99);
        let picks_a: Vec<_> = (0..16).map(|_| DeviceCommand::choose(&mut a)).collect();
        let picks_b: Vec<_> = (0..16).map(|_| DeviceCommand::choose(&mut b)).collect();
        assert_eq!(picks_a, picks_b);
    }
}
