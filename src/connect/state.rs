//! Connection state.
//!
//! [`ConnectionState`] is the public snapshot the presentation layer
//! renders. Internally the live handles sit in one [`Link`] value, so a
//! client without a transport, or a connected state without an identity,
//! cannot be expressed.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::mem;
use std::sync::Arc;

use crate::client::Client;
use crate::environment::PopupWindowRef;
use crate::identifiers::SessionId;
use crate::protocol::{ConnectResult, Identity, PermissionScope};
use crate::transport::{Strategy, Transport};

// ============================================================================
// ConnectionState
// ============================================================================

/// Snapshot of the connection, as shown to the user.
///
/// `is_connected` is `true` exactly when `identity` is `Some`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    /// A handshake succeeded and the session is live.
    pub is_connected: bool,

    /// A user-initiated connect is in flight.
    pub is_connecting: bool,

    /// The silent mount-time reconnect has not settled yet.
    pub is_auto_connecting: bool,

    /// Strategy of the live or in-flight connection.
    pub strategy: Option<Strategy>,

    /// Identity of the connected wallet.
    pub identity: Option<Identity>,

    /// Permissions granted by the wallet.
    pub permissions: Vec<PermissionScope>,

    /// Last user-visible failure.
    pub error: Option<String>,
}

impl ConnectionState {
    /// Returns `true` if the permission was granted.
    #[must_use]
    pub fn has_permission(&self, scope: &str) -> bool {
        self.permissions.iter().any(|p| p.as_str() == scope)
    }

    /// Returns `true` when a connect affordance should be shown.
    ///
    /// Hidden while the silent check runs so it does not flash.
    #[inline]
    #[must_use]
    pub fn should_offer_connect(&self) -> bool {
        !self.is_connected && !self.is_connecting && !self.is_auto_connecting
    }
}

// ============================================================================
// Session
// ============================================================================

/// Live handles of an established connection.
pub(crate) struct Session {
    pub strategy: Strategy,
    pub transport: Arc<dyn Transport>,
    pub client: Arc<dyn Client>,
    pub identity: Identity,
    pub permissions: Vec<PermissionScope>,
    pub session_id: SessionId,
}

impl Session {
    /// Assembles a session from a completed handshake.
    pub fn new(
        strategy: Strategy,
        transport: Arc<dyn Transport>,
        client: Arc<dyn Client>,
        result: ConnectResult,
    ) -> Self {
        Self {
            strategy,
            transport,
            client,
            identity: result.identity,
            permissions: result.permissions,
            session_id: result.session_id,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("strategy", &self.strategy)
            .field("transport", &self.transport.id())
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Link
// ============================================================================

/// Ownership of the transport and client.
#[derive(Default)]
pub(crate) enum Link {
    /// Nothing live.
    #[default]
    Disconnected,
    /// Attempt in flight; `transport` is the one being set up, or the
    /// previous session's until the attempt replaces it.
    Connecting {
        strategy: Strategy,
        transport: Option<Arc<dyn Transport>>,
    },
    /// Handshake done.
    Connected(Session),
}

impl Link {
    /// Returns `true` while an attempt is in flight.
    #[inline]
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting { .. })
    }

    /// Returns the strategy, if any.
    pub fn strategy(&self) -> Option<Strategy> {
        match self {
            Self::Disconnected => None,
            Self::Connecting { strategy, .. } => Some(*strategy),
            Self::Connected(session) => Some(session.strategy),
        }
    }

    /// Takes the link, leaving [`Link::Disconnected`].
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Consumes the link, returning its transport.
    ///
    /// The client is dropped: it is never reused across this boundary.
    pub fn into_transport(self) -> Option<Arc<dyn Transport>> {
        match self {
            Self::Disconnected => None,
            Self::Connecting { transport, .. } => transport,
            Self::Connected(session) => Some(session.transport),
        }
    }
}

// ============================================================================
// Shared
// ============================================================================

/// Mutable state behind the machine's lock.
#[derive(Default)]
pub(crate) struct Shared {
    pub link: Link,
    /// Popup opened by the last popup attempt. Lives beside `link` because
    /// the user, not this crate, decides when it closes.
    pub popup: Option<PopupWindowRef>,
    pub error: Option<String>,
    pub auto_connecting: bool,
    /// The silent reconnect has been started or ruled out.
    pub auto_connect_attempted: bool,
    /// Bumped by every begin, disconnect and detected loss; an attempt whose
    /// epoch is stale discards its result.
    pub epoch: u64,
}

impl Shared {
    /// Builds the public snapshot.
    pub fn snapshot(&self) -> ConnectionState {
        let (identity, permissions) = match &self.link {
            Link::Connected(session) => (Some(session.identity.clone()), session.permissions.clone()),
            _ => (None, Vec::new()),
        };

        ConnectionState {
            is_connected: identity.is_some(),
            is_connecting: self.link.is_connecting(),
            is_auto_connecting: self.auto_connecting,
            strategy: self.link.strategy(),
            identity,
            permissions,
            error: self.error.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
