//! Cross-window messages.
//!
//! The only message this crate reads itself is the readiness announcement
//! a freshly opened wallet popup posts once it can accept requests.
//!
//! # Format
//!
//! ```json
//! { "type": "sphere-connect:host-ready" }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;

// ============================================================================
// Constants
// ============================================================================

/// Type tag of the readiness announcement.
pub const HOST_READY_TYPE: &str = "sphere-connect:host-ready";

// ============================================================================
// WindowMessage
// ============================================================================

/// A message received on the cross-window messaging channel.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowMessage {
    /// Origin of the sending window.
    pub origin: String,

    /// Message payload.
    pub data: Value,
}

impl WindowMessage {
    /// Creates a message.
    #[inline]
    #[must_use]
    pub fn new(origin: impl Into<String>, data: Value) -> Self {
        Self {
            origin: origin.into(),
            data,
        }
    }

    /// Creates a readiness announcement from `origin`.
    #[must_use]
    pub fn host_ready(origin: impl Into<String>) -> Self {
        Self::new(origin, serde_json::json!({ "type": HOST_READY_TYPE }))
    }

    /// Returns the payload's `type` field, if it is a string.
    #[inline]
    #[must_use]
    pub fn message_type(&self) -> Option<&str> {
        self.data.get("type").and_then(Value::as_str)
    }

    /// Returns `true` if this is the readiness announcement.
    ///
    /// Matches the `type` field exactly; nothing else is inspected.
    #[inline]
    #[must_use]
    pub fn is_host_ready(&self) -> bool {
        self.message_type() == Some(HOST_READY_TYPE)
    }
}

// ============================================================================
// Tests
// ============================================================================
