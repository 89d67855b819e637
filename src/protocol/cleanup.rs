//! Defensive cleanup of raw socket responses.
//!
//! The server's raw representation of a response is not guaranteed to be
//! strict JSON text: payloads arrive wrapped in stray quoting characters,
//! single-quoted, or with literal `\n` escape sequences embedded. The
//! cleanup pass normalizes all of that before decoding is attempted.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Characters stripped from both ends of a raw payload.
const WRAPPING: &[char] = &['\'', '<', '>', '(', ')', ' '];

// ============================================================================
// Functions
// ============================================================================

/// Cleans a raw payload into a best-effort JSON string.
///
/// Strips leading/trailing wrapping characters, normalizes single quotes
/// to double quotes, and removes literal `\n` sequences.
#[must_use]
pub fn clean_payload(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.trim_matches(WRAPPING).replace('\'', "\"").replace("\\n", "")
}

/// Cleans and decodes a raw payload as JSON.
///
/// # Errors
///
/// Returns the underlying `serde_json` error when the cleaned payload is
/// still not valid JSON. Callers treat this as a non-fatal, logged outcome.
pub fn decode_payload(raw: &[u8]) -> serde_json::Result<Value> {
    serde_json::from_str(&clean_payload(raw))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::identity::ClientIdentity;
    use crate::protocol::message::{CommandMessage, DeviceCommand};

    #[test]
    fn test_strips_wrapping_characters() {
        let raw = b"'<({\"Answer\":\"pong\"})>' ";
        assert_eq!(clean_payload(raw), "{\"Answer\":\"pong\"}");
    }

    #[test]
    fn test_normalizes_single_quotes() {
        let raw = b"{'Answer': 'pong'}";
        assert_eq!(clean_payload(raw), "{\"Answer\": \"pong\"}");
    }

    #[test]
    fn test_drops_literal_newline_escapes() {
        let raw = b"{\"Answer\":\\n\"pong\"}";
        assert_eq!(clean_payload(raw), "{\"Answer\":\"pong\"}");
    }

    #[test]
    fn test_decode_cleaned_payload() {
        let value = decode_payload(b"'{\"Answer\": \"pong\"}'").expect("decode");
        assert_eq!(value["Answer"], "pong");
    }

    #[test]
    fn test_decode_failure_is_reported() {
        assert!(decode_payload(b"not json at all {{{").is_err());
    }

    #[test]
    fn test_strict_json_round_trips_through_cleanup() {
        let identity = ClientIdentity::indexed("sockets client", 3);
        let message = CommandMessage::new(&identity, DeviceCommand::OpenDoor, 1706000000);
        let json = message.to_json().expect("serialize");

        let value = decode_payload(json.as_bytes()).expect("decode");
        let decoded: CommandMessage = serde_json::from_value(value).expect("typed decode");

        assert_eq!(decoded, message);
    }
}
