//! Error types for Sphere Connect.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use sphere_connect::{Result, WalletConnect};
//!
//! async fn balance(wallet: &WalletConnect) -> Result<serde_json::Value> {
//!     wallet.query("sphere_getBalance", None).await
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::PopupBlocked`], [`Error::HostReadyTimeout`], [`Error::NotConnected`], [`Error::PopupClosed`], [`Error::ConnectInProgress`], [`Error::Connection`], [`Error::ConnectionClosed`] |
//! | Remote | [`Error::Remote`] |
//! | Host | [`Error::Environment`], [`Error::Storage`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// `Display` strings of the connection variants are meant to be shown to the
/// user as-is; they end up in [`ConnectionState::error`](crate::ConnectionState).
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned by [`WalletConnectBuilder::build`](crate::WalletConnectBuilder::build)
    /// when a collaborator is missing or a URL is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// The popup window could not be opened.
    ///
    /// Usually a pop-up blocker returned nothing from the open call.
    #[error("Popup blocked. Please allow popups for this site.")]
    PopupBlocked,

    /// The wallet popup never announced it was ready.
    #[error("Wallet did not respond within {timeout_ms}ms")]
    HostReadyTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// No live client exists.
    #[error("Not connected")]
    NotConnected,

    /// The user closed the wallet popup; the session was torn down.
    #[error("Wallet popup was closed")]
    PopupClosed,

    /// Another connect attempt is still in flight.
    #[error("A connection attempt is already in progress")]
    ConnectInProgress,

    /// Transport-level connection failure.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Transport closed unexpectedly or was destroyed.
    #[error("Connection closed")]
    ConnectionClosed,

    // ========================================================================
    // Remote Errors
    // ========================================================================
    /// The wallet rejected a handshake, query or intent.
    ///
    /// The message is the wallet's own, surfaced verbatim.
    #[error("{message}")]
    Remote {
        /// Rejection message from the wallet.
        message: String,
    },

    // ========================================================================
    // Host Errors
    // ========================================================================
    /// The hosting environment refused an inspection (cross-origin access).
    #[error("Environment error: {message}")]
    Environment {
        /// Description of the environment failure.
        message: String,
    },

    /// Session store read or write failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// URL parse error.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
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

    /// Creates a readiness timeout error.
    #[inline]
    pub fn host_ready_timeout(timeout_ms: u64) -> Self {
        Self::HostReadyTimeout { timeout_ms }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a remote rejection error.
    #[inline]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Creates an environment error.
    #[inline]
    pub fn environment(message: impl Into<String>) -> Self {
        Self::Environment {
            message: message.into(),
        }
    }

    /// Creates a storage error.
    #[inline]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
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
        matches!(self, Self::HostReadyTimeout { .. })
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::PopupBlocked
                | Self::HostReadyTimeout { .. }
                | Self::NotConnected
                | Self::PopupClosed
                | Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }

    /// Returns `true` if the session was lost out-of-band.
    ///
    /// Only a closed popup counts; the caller must reconnect.
    #[inline]
    #[must_use]
    pub fn is_session_lost(&self) -> bool {
        matches!(self, Self::PopupClosed)
    }

    /// Returns `true` if the wallet itself rejected the call.
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
