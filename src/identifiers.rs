//! Type-safe identifiers.
//!
//! Newtype wrappers so a session identifier is never mixed up with a
//! transport instance or an arbitrary string.
//!
//! | Type | Origin | Description |
//! |------|--------|-------------|
//! | [`SessionId`] | Wallet | Opaque resume hint returned by the handshake |
//! | [`TransportId`] | Local | Unique per transport instance, for logs and tests |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// SessionId
// ============================================================================

/// Session identifier issued by the wallet.
///
/// Never interpreted locally: it is persisted after a popup handshake and
/// handed back to the next client as a resume hint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps a raw session identifier.
    ///
    /// Returns `None` for an empty string.
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Returns the raw identifier.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// TransportId
// ============================================================================

/// Identifier of one transport instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportId(Uuid);

impl TransportId {
    /// Generates a fresh identifier.
    #[inline]
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransportId {
    fn default() -> Self {
        Self::generate()
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
