//! Wallet protocol vocabulary.
//!
//! The wire format itself belongs to the client library; this module only
//! holds the records and names the connection layer passes around.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Cross-window messages and the readiness tag |
//! | `method` | Query, intent and event names |
//! | `types` | Handshake payloads: identity, permissions, dApp metadata |

// ============================================================================
// Submodules
// ============================================================================

/// Cross-window messages.
pub mod message;

/// Query, intent and event names.
pub mod method;

/// Handshake payload types.
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use message::{HOST_READY_TYPE, WindowMessage};
pub use method::{event, intent, rpc};
pub use types::{ConnectResult, DAppMetadata, Identity, PermissionScope, normalize_nametag};
