//! Transport layer.
//!
//! A transport is an opaque duplex channel between the dApp and the wallet.
//! The connection state machine never reads its frames; it only builds one
//! per connection attempt and destroys it when done.
//!
//! # Strategies
//!
//! ```text
//! ┌──────────────┐   parent window    ┌─────────────────┐
//! │              │◄──────────────────►│ Wallet (iframe) │
//! │              │                    └─────────────────┘
//! │              │   extension bridge ┌─────────────────┐
//! │  dApp page   │◄──────────────────►│ Wallet extension│
//! │              │                    └─────────────────┘
//! │              │   popup window     ┌─────────────────┐
//! │              │◄──────────────────►│ Wallet (popup)  │
//! └──────────────┘                    └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `websocket` | WebSocket client transport for non-browser dApps |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket client transport.
pub mod websocket;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::environment::{HostEnvironment, PopupWindowRef, has_extension, is_in_iframe};
use crate::error::Result;
use crate::identifiers::TransportId;

// ============================================================================
// Re-exports
// ============================================================================

pub use websocket::WebSocketTransport;

// ============================================================================
// Types
// ============================================================================

/// Callback for inbound frames.
pub type MessageHandler = Box<dyn Fn(Value) + Send + Sync>;

// ============================================================================
// Strategy
// ============================================================================

/// Which transport a connection uses.
///
/// Decides the liveness rules applied before reusing a client: only popup
/// sessions can be lost out-of-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Embedded in the wallet's iframe; talk to the parent window.
    Iframe,
    /// Installed browser extension.
    Extension,
    /// Detached popup window.
    Popup,
}

impl Strategy {
    /// Picks a strategy by priority: iframe, then extension, then popup.
    #[inline]
    #[must_use]
    pub const fn select(in_iframe: bool, extension: bool) -> Self {
        if in_iframe {
            Self::Iframe
        } else if extension {
            Self::Extension
        } else {
            Self::Popup
        }
    }

    /// Runs detection against the environment and picks a strategy.
    #[must_use]
    pub fn detect(env: &dyn HostEnvironment) -> Self {
        let in_iframe = is_in_iframe(env);
        // Extension detection is skipped when framed, matching the priority.
        let extension = !in_iframe && has_extension(env);
        Self::select(in_iframe, extension)
    }

    /// Returns the strategy name.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Iframe => "iframe",
            Self::Extension => "extension",
            Self::Popup => "popup",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Transport
// ============================================================================

/// A duplex channel to the wallet.
pub trait Transport: Send + Sync {
    /// Identifier of this instance.
    fn id(&self) -> TransportId;

    /// Sends one frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConnectionClosed`](crate::Error::ConnectionClosed)
    /// after [`destroy`](Self::destroy).
    fn send(&self, message: Value) -> Result<()>;

    /// Installs the inbound frame callback, replacing any previous one.
    fn set_message_handler(&self, handler: MessageHandler);

    /// Tears the channel down. Idempotent.
    fn destroy(&self);

    /// Returns `true` once destroyed or closed by the remote end.
    fn is_destroyed(&self) -> bool;
}

// ============================================================================
// TransportFactory
// ============================================================================

/// Builds transports for each strategy.
///
/// Browser builds wrap the post-message and extension-bridge channels; the
/// state machine only sees the resulting [`Transport`] objects.
pub trait TransportFactory: Send + Sync {
    /// Channel to the parent window.
    fn iframe(&self) -> Result<Arc<dyn Transport>>;

    /// Channel through the installed extension.
    fn extension(&self) -> Result<Arc<dyn Transport>>;

    /// Channel to a popup window, restricted to `target_origin`.
    fn popup(&self, target: &PopupWindowRef, target_origin: &str) -> Result<Arc<dyn Transport>>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_priority() {
        assert_eq!(Strategy::select(true, true), Strategy::Iframe);
        assert_eq!(Strategy::select(true, false), Strategy::Iframe);
        assert_eq!(Strategy::select(false, true), Strategy::Extension);
        assert_eq!(Strategy::select(false, false), Strategy::Popup);
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::Iframe.to_string(), "iframe");
        assert_eq!(Strategy::Extension.to_string(), "extension");
        assert_eq!(Strategy::Popup.to_string(), "popup");
    }
}
