//! Sphere Connect - dApp-side wallet connection library.
//!
//! Connects a decentralized application to the Sphere wallet and routes
//! queries, intents and event subscriptions to it.
//!
//! # Architecture
//!
//! Three ways to reach the wallet, tried in priority order:
//!
//! - **Iframe**: the dApp is embedded in the wallet and talks to its parent
//! - **Extension**: a browser extension exposes the wallet to the page
//! - **Popup**: the dApp opens the wallet web app in a separate window
//!
//! Key design principles:
//!
//! - Platform capabilities come in through traits ([`HostEnvironment`],
//!   [`TransportFactory`], [`ClientFactory`], [`SessionStore`])
//! - One state machine ([`WalletConnect`]) owns the transport, client and
//!   popup; it publishes a [`ConnectionState`] snapshot on every change
//! - Failures during connect end up in the state, never as panics
//!
//! # Quick Start
//!
//! ```ignore
//! use sphere_connect::{WalletConnect, protocol::rpc};
//!
//! let wallet = WalletConnect::builder()
//!     .wallet_url("http://localhost:5173")
//!     .environment(env)
//!     .transports(transports)
//!     .clients(clients)
//!     .mount()?;
//!
//! let state = wallet.connect().await;
//! if state.is_connected {
//!     let balance = wallet.query(rpc::GET_BALANCE, None).await?;
//!     println!("{balance}");
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`connect`] | State machine, builder and [`ConnectionState`] |
//! | [`environment`] | Detection, popup handle and readiness wait |
//! | [`transport`] | [`Strategy`], transport contract, WebSocket transport |
//! | [`client`] | Protocol client contract |
//! | [`protocol`] | Wire types and method names |
//! | [`storage`] | Session persistence |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |

// ============================================================================
// Modules
// ============================================================================

/// Protocol client contract.
pub mod client;

/// Connection state machine.
///
/// Use [`WalletConnect::builder()`] to create one.
pub mod connect;

/// Hosting environment capabilities.
pub mod environment;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Wallet protocol types.
pub mod protocol;

/// Session persistence.
pub mod storage;

/// Transport strategies and implementations.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Connection types
pub use connect::{
    ConnectConfig, ConnectionState, DEFAULT_DISCONNECT_TIMEOUT, WalletConnect,
    WalletConnectBuilder,
};

// Collaborator contracts
pub use client::{Client, ClientFactory, ClientOptions, EventHandler, Subscription};
pub use environment::{
    FrameRelation, HostEnvironment, PopupWindow, PopupWindowRef, WalletGlobal, has_extension,
    is_in_iframe,
};
pub use storage::{FileSessionStore, MemorySessionStore, SessionStore, SessionStoreExt};
pub use transport::{Strategy, Transport, TransportFactory, WebSocketTransport};

// Protocol types
pub use protocol::{ConnectResult, DAppMetadata, Identity, PermissionScope};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{SessionId, TransportId};
