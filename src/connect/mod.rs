//! Wallet connection state machine.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`WalletConnect`] | Strategy selection, connect/disconnect, call routing |
//! | [`WalletConnectBuilder`] | Collaborators and configuration |
//! | [`ConnectionState`] | Snapshot published on every change |

// ============================================================================
// Submodules
// ============================================================================

/// Builder and validated configuration.
pub mod builder;

/// The state machine.
pub mod core;

/// Public snapshot and internal link state.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{ConnectConfig, DEFAULT_DISCONNECT_TIMEOUT, WalletConnectBuilder};
pub use core::WalletConnect;
pub use state::ConnectionState;
