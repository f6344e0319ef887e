//! Handshake payload types.
//!
//! Records exchanged with the wallet during the handshake. The state
//! machine stores them but never looks inside.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identifiers::SessionId;

// ============================================================================
// Identity
// ============================================================================

/// Public identity of the connected wallet.
///
/// # Format
///
/// ```json
/// {
///   "chainPubkey": "02abc...",
///   "l1Address": "alpha1...",
///   "directAddress": "DIRECT://...",
///   "nametag": "alice"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Compressed chain public key (hex).
    pub chain_pubkey: String,

    /// L1 address.
    pub l1_address: String,

    /// Direct address, if the wallet exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_address: Option<String>,

    /// Human-readable tag, without the leading `@`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nametag: Option<String>,
}

impl Identity {
    /// Returns the `@tag` form when a nametag is registered.
    #[must_use]
    pub fn display_tag(&self) -> Option<String> {
        self.nametag.as_deref().map(normalize_nametag)
    }
}

// ============================================================================
// PermissionScope
// ============================================================================

/// A permission granted to the dApp.
///
/// Kept as an open string: wallets may grant scopes this crate does not
/// know about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionScope(String);

impl PermissionScope {
    /// Read the wallet identity.
    pub const IDENTITY_READ: &'static str = "identity:read";
    /// Read balances and assets.
    pub const BALANCE_READ: &'static str = "balance:read";
    /// Read individual tokens.
    pub const TOKENS_READ: &'static str = "tokens:read";
    /// Read transaction history.
    pub const HISTORY_READ: &'static str = "history:read";
    /// Read L1 balance and history.
    pub const L1_READ: &'static str = "l1:read";
    /// Resolve nametags to peers.
    pub const RESOLVE_PEER: &'static str = "resolve:peer";
    /// Receive wallet events.
    pub const EVENTS_SUBSCRIBE: &'static str = "events:subscribe";
    /// Request transfers.
    pub const TRANSFER_REQUEST: &'static str = "transfer:request";
    /// Request direct messages.
    pub const DM_REQUEST: &'static str = "dm:request";
    /// Request message signatures.
    pub const SIGN_REQUEST: &'static str = "sign:request";

    /// Creates a scope from its wire name.
    #[inline]
    #[must_use]
    pub fn new(scope: impl Into<String>) -> Self {
        Self(scope.into())
    }

    /// Returns the wire name.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PermissionScope {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// DAppMetadata
// ============================================================================

/// Metadata the wallet shows on its approval screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DAppMetadata {
    /// Application name.
    pub name: String,

    /// Short description.
    pub description: String,

    /// Application URL (usually the page origin).
    pub url: String,

    /// Optional icon URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl DAppMetadata {
    /// Creates metadata without an icon.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            url: url.into(),
            icon: None,
        }
    }

    /// Sets the icon URL.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

// ============================================================================
// ConnectResult
// ============================================================================

/// Outcome of a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResult {
    /// Wallet identity.
    pub identity: Identity,

    /// Granted permissions.
    pub permissions: Vec<PermissionScope>,

    /// Session identifier usable as a resume hint.
    pub session_id: SessionId,
}

// ============================================================================
// Helpers
// ============================================================================

/// Prefixes `@` to a nametag unless already present.
///
/// ```
/// use sphere_connect::protocol::normalize_nametag;
///
/// assert_eq!(normalize_nametag("alice"), "@alice");
/// assert_eq!(normalize_nametag("@bob"), "@bob");
/// ```
#[must_use]
pub fn normalize_nametag(tag: &str) -> String {
    if tag.starts_with('@') {
        tag.to_string()
    } else {
        format!("@{tag}")
    }
}

// ============================================================================
// Tests
// ============================================================================
