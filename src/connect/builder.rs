//! Builder pattern for the connection state machine.
//!
//! # Example
//!
//! ```ignore
//! use sphere_connect::WalletConnect;
//!
//! let wallet = WalletConnect::builder()
//!     .wallet_url("http://localhost:5173")
//!     .environment(env)
//!     .transports(transports)
//!     .clients(clients)
//!     .mount()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::client::ClientFactory;
use crate::environment::{DEFAULT_HOST_READY_TIMEOUT, HostEnvironment};
use crate::error::{Error, Result};
use crate::protocol::DAppMetadata;
use crate::storage::{MemorySessionStore, SessionStore};
use crate::transport::TransportFactory;

use super::core::WalletConnect;

// ============================================================================
// Constants
// ============================================================================

/// Default bound on the best-effort disconnect notification.
pub const DEFAULT_DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default dApp name.
const DEFAULT_DAPP_NAME: &str = "Connect Demo";

/// Default dApp description.
const DEFAULT_DAPP_DESCRIPTION: &str = "Sphere Connect browser example";

// ============================================================================
// ConnectConfig
// ============================================================================

/// Validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectConfig {
    /// Base URL of the wallet web app.
    pub wallet_url: Url,

    /// Metadata presented to the wallet.
    pub dapp: DAppMetadata,

    /// Bound on the popup readiness wait.
    pub host_ready_timeout: Duration,

    /// Bound on the disconnect notification.
    pub disconnect_timeout: Duration,
}

impl ConnectConfig {
    /// URL opened in the popup: `<wallet>/connect?origin=<page origin>`.
    #[must_use]
    pub fn popup_url(&self, page_origin: &str) -> String {
        format!(
            "{}/connect?origin={}",
            self.wallet_url.as_str().trim_end_matches('/'),
            urlencoding::encode(page_origin)
        )
    }

    /// Origin the popup transport is restricted to.
    #[must_use]
    pub fn target_origin(&self) -> String {
        self.wallet_url.origin().ascii_serialization()
    }
}

// ============================================================================
// WalletConnectBuilder
// ============================================================================

/// Builder for a [`WalletConnect`] instance.
///
/// Use [`WalletConnect::builder()`] to create one.
#[derive(Default)]
pub struct WalletConnectBuilder {
    wallet_url: Option<String>,
    dapp: Option<DAppMetadata>,
    host_ready_timeout: Option<Duration>,
    disconnect_timeout: Option<Duration>,
    environment: Option<Arc<dyn HostEnvironment>>,
    transports: Option<Arc<dyn TransportFactory>>,
    clients: Option<Arc<dyn ClientFactory>>,
    session_store: Option<Arc<dyn SessionStore>>,
}

impl WalletConnectBuilder {
    /// Creates an empty builder.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wallet web app URL (required).
    #[must_use]
    pub fn wallet_url(mut self, url: impl Into<String>) -> Self {
        self.wallet_url = Some(url.into());
        self
    }

    /// Sets the dApp metadata.
    ///
    /// Defaults to a demo name with the page origin as URL.
    #[must_use]
    pub fn dapp(mut self, dapp: DAppMetadata) -> Self {
        self.dapp = Some(dapp);
        self
    }

    /// Sets the popup readiness bound (default 30s).
    #[must_use]
    pub fn host_ready_timeout(mut self, timeout: Duration) -> Self {
        self.host_ready_timeout = Some(timeout);
        self
    }

    /// Sets the disconnect notification bound (default 5s).
    #[must_use]
    pub fn disconnect_timeout(mut self, timeout: Duration) -> Self {
        self.disconnect_timeout = Some(timeout);
        self
    }

    /// Sets the hosting environment (required).
    #[must_use]
    pub fn environment(mut self, environment: Arc<dyn HostEnvironment>) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Sets the transport factory (required).
    #[must_use]
    pub fn transports(mut self, transports: Arc<dyn TransportFactory>) -> Self {
        self.transports = Some(transports);
        self
    }

    /// Sets the client factory (required).
    #[must_use]
    pub fn clients(mut self, clients: Arc<dyn ClientFactory>) -> Self {
        self.clients = Some(clients);
        self
    }

    /// Sets the session store (default: in memory).
    #[must_use]
    pub fn session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Builds the state machine without starting the silent reconnect.
    ///
    /// `is_auto_connecting` stays `false` until
    /// [`WalletConnect::auto_connect`] is called; use [`mount`](Self::mount)
    /// to start it right away.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if a required setting is missing
    /// - [`Error::Config`] if the wallet URL is not http(s)
    /// - [`Error::Url`] if the wallet URL does not parse
    pub fn build(self) -> Result<WalletConnect> {
        let environment = self.environment.ok_or_else(|| {
            Error::config("Host environment is required. Use .environment() to set it.")
        })?;
        let transports = self.transports.ok_or_else(|| {
            Error::config("Transport factory is required. Use .transports() to set it.")
        })?;
        let clients = self.clients.ok_or_else(|| {
            Error::config("Client factory is required. Use .clients() to set it.")
        })?;

        let wallet_url = Self::validate_wallet_url(self.wallet_url)?;
        let dapp = self.dapp.unwrap_or_else(|| {
            DAppMetadata::new(DEFAULT_DAPP_NAME, DEFAULT_DAPP_DESCRIPTION, environment.origin())
        });

        let config = ConnectConfig {
            wallet_url,
            dapp,
            host_ready_timeout: self.host_ready_timeout.unwrap_or(DEFAULT_HOST_READY_TIMEOUT),
            disconnect_timeout: self.disconnect_timeout.unwrap_or(DEFAULT_DISCONNECT_TIMEOUT),
        };

        debug!(wallet_url = %config.wallet_url, dapp = %config.dapp.name, "WalletConnect configured");

        let store = self
            .session_store
            .unwrap_or_else(|| Arc::new(MemorySessionStore::new()));

        Ok(WalletConnect::new(config, environment, transports, clients, store))
    }

    /// Builds the state machine and spawns the silent reconnect.
    ///
    /// `is_auto_connecting` is already raised when this returns if the
    /// silent reconnect runs. Must be called inside a tokio runtime.
    pub fn mount(self) -> Result<WalletConnect> {
        let wallet = self.build()?;
        if let Some(epoch) = wallet.begin_auto_connect() {
            let task = wallet.clone();
            tokio::spawn(async move { task.run_auto_connect(epoch).await });
        }
        Ok(wallet)
    }

    /// Validates the wallet URL.
    fn validate_wallet_url(url: Option<String>) -> Result<Url> {
        let url = url.ok_or_else(|| {
            Error::config(
                "Wallet URL is required. Use .wallet_url() to set it.\n\
                 Example: WalletConnect::builder().wallet_url(\"http://localhost:5173\")",
            )
        })?;

        let url = Url::parse(&url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Wallet URL must be http or https, got {}",
                url.scheme()
            )));
        }
        Ok(url)
    }
}

// ============================================================================
// Tests
// ============================================================================
