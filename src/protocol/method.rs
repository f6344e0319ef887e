//! Wire names of wallet queries and intents.
//!
//! Queries are read-only. Intents have side effects on the wallet (a
//! transfer, a message) and are never resubmitted by this crate.
//!
//! | Kind | Examples |
//! |------|----------|
//! | Query | `sphere_getBalance`, `sphere_resolve` |
//! | Intent | `send`, `dm` |
//! | Event | `transfer:incoming` |

// ============================================================================
// Queries
// ============================================================================

/// Read-only RPC method names.
pub mod rpc {
    /// Wallet identity.
    pub const GET_IDENTITY: &str = "sphere_getIdentity";
    /// L3 balance per coin.
    pub const GET_BALANCE: &str = "sphere_getBalance";
    /// Asset list.
    pub const GET_ASSETS: &str = "sphere_getAssets";
    /// Total fiat value.
    pub const GET_FIAT_BALANCE: &str = "sphere_getFiatBalance";
    /// Token list.
    pub const GET_TOKENS: &str = "sphere_getTokens";
    /// Transaction history.
    pub const GET_HISTORY: &str = "sphere_getHistory";
    /// L1 balance.
    pub const L1_GET_BALANCE: &str = "sphere_l1GetBalance";
    /// L1 history.
    pub const L1_GET_HISTORY: &str = "sphere_l1GetHistory";
    /// Resolve a nametag to a peer.
    pub const RESOLVE: &str = "sphere_resolve";
    /// Subscribe to a wallet event.
    pub const SUBSCRIBE: &str = "sphere_subscribe";
    /// Unsubscribe from a wallet event.
    pub const UNSUBSCRIBE: &str = "sphere_unsubscribe";
    /// End the session.
    pub const DISCONNECT: &str = "sphere_disconnect";

    /// All query names.
    pub const ALL: &[&str] = &[
        GET_IDENTITY,
        GET_BALANCE,
        GET_ASSETS,
        GET_FIAT_BALANCE,
        GET_TOKENS,
        GET_HISTORY,
        L1_GET_BALANCE,
        L1_GET_HISTORY,
        RESOLVE,
        SUBSCRIBE,
        UNSUBSCRIBE,
        DISCONNECT,
    ];
}

// ============================================================================
// Intents
// ============================================================================

/// Side-effecting intent action names.
pub mod intent {
    /// Send tokens.
    pub const SEND: &str = "send";
    /// Send L1 coins.
    pub const L1_SEND: &str = "l1_send";
    /// Send a direct message.
    pub const DM: &str = "dm";
    /// Request a payment.
    pub const PAYMENT_REQUEST: &str = "payment_request";
    /// Show a receive address.
    pub const RECEIVE: &str = "receive";
    /// Sign an arbitrary message.
    pub const SIGN_MESSAGE: &str = "sign_message";

    /// All intent names.
    pub const ALL: &[&str] = &[SEND, L1_SEND, DM, PAYMENT_REQUEST, RECEIVE, SIGN_MESSAGE];
}

// ============================================================================
// Events
// ============================================================================

/// Wallet-originated event names.
pub mod event {
    /// Incoming transfer.
    pub const TRANSFER_INCOMING: &str = "transfer:incoming";
    /// Outgoing transfer confirmed.
    pub const TRANSFER_CONFIRMED: &str = "transfer:confirmed";
    /// Direct message received.
    pub const MESSAGE_DM: &str = "message:dm";
    /// Wallet identity changed.
    pub const IDENTITY_CHANGED: &str = "identity:changed";
}

// ============================================================================
// Tests
// ============================================================================
