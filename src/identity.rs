//! Client identity.
//!
//! Each session carries a [`ClientIdentity`] that is stable for the
//! session's lifetime: it labels every log line and fills the `Sender`
//! field of outbound command messages. Identities are unique within a
//! pool because the id is derived from the creation index.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// ClientIdentity
// ============================================================================

/// Stable per-session identity, immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientIdentity {
    /// Human-readable client name, shared by all sessions of one variant.
    name: String,
    /// Unique id within the pool, derived from the creation index.
    id: String,
}

impl ClientIdentity {
    /// Creates an identity from an explicit name and id.
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }

    /// Creates an identity with an index-derived id (`socket_{index}`).
    #[inline]
    #[must_use]
    pub fn indexed(name: impl Into<String>, index: usize) -> Self {
        Self::new(name, format!("socket_{index}"))
    }

    /// Returns the client name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the pool-unique id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the `Sender` wire field, `{name}-{id}`.
    #[inline]
    #[must_use]
    pub fn sender(&self) -> String {
        format!("{}-{}", self.name, self.id)
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

// ============================================================================
// Tests
// ============================================================================
