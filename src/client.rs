//! Connection client contract.
//!
//! The client speaks the wallet protocol over a [`Transport`]. It is
//! supplied by the protocol library through a [`ClientFactory`]; the state
//! machine creates a fresh one for every connection attempt and never
//! reuses it after a disconnect.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::identifiers::SessionId;
use crate::protocol::{ConnectResult, DAppMetadata};
use crate::transport::Transport;

// ============================================================================
// Types
// ============================================================================

/// Callback for wallet-originated events.
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

// ============================================================================
// ClientOptions
// ============================================================================

/// Everything a client is constructed with.
#[derive(Clone)]
pub struct ClientOptions {
    /// Channel to the wallet.
    pub transport: Arc<dyn Transport>,

    /// Metadata shown on the wallet's approval screen.
    pub dapp: DAppMetadata,

    /// Session to resume, skipping re-approval if the wallet still knows it.
    pub resume_session_id: Option<SessionId>,

    /// Fail instead of showing any approval UI.
    pub silent: bool,
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("transport", &self.transport.id())
            .field("dapp", &self.dapp.name)
            .field("resume_session_id", &self.resume_session_id)
            .field("silent", &self.silent)
            .finish()
    }
}

// ============================================================================
// Client
// ============================================================================

/// A protocol client bound to one transport.
#[async_trait]
pub trait Client: Send + Sync {
    /// Performs the handshake.
    async fn connect(&self) -> Result<ConnectResult>;

    /// Tells the wallet the session is over.
    async fn disconnect(&self) -> Result<()>;

    /// Read-only call.
    async fn query(&self, method: &str, params: Option<Value>) -> Result<Value>;

    /// Side-effecting call.
    async fn intent(&self, action: &str, params: Value) -> Result<Value>;

    /// Subscribes to a wallet event.
    fn on(&self, event: &str, handler: EventHandler) -> Subscription;
}

/// Creates clients.
pub trait ClientFactory: Send + Sync {
    /// Builds a client. Must not perform I/O; the handshake happens in
    /// [`Client::connect`].
    fn create(&self, options: ClientOptions) -> Result<Arc<dyn Client>>;
}

// ============================================================================
// Subscription
// ============================================================================

/// Handle returned by [`Client::on`].
///
/// [`unsubscribe`](Self::unsubscribe) removes exactly the handler it was
/// created for. Dropping the handle keeps the handler installed.
#[must_use = "dropping a Subscription keeps the handler installed"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wraps an unsubscribe action.
    #[inline]
    pub fn new(unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Removes the handler.
    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
