//! Connection state machine.
//!
//! ```text
//! Disconnected ──connect*()──► Connecting ──success──► Connected
//!      ▲                           │                      │
//!      └──────failure (error)──────┘                      │
//!      ▲                                                  │
//!      ├──────────────disconnect() (error cleared)────────┤
//!      └────popup closed, seen on next use (error set)────┘
//! ```
//!
//! Every disconnected state is a valid entry point for another connect.
//! The lock is never held across an `.await`; the suspension points are the
//! readiness wait, the handshake and remote calls.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::client::{Client, ClientFactory, ClientOptions, Subscription};
use crate::environment::{
    HostEnvironment, HostReadyWaiter, POPUP_WINDOW_NAME, PopupWindowRef, has_extension,
    is_in_iframe, popup_features,
};
use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::storage::{SessionStore, SessionStoreExt};
use crate::transport::{Strategy, Transport, TransportFactory};

use super::builder::{ConnectConfig, WalletConnectBuilder};
use super::state::{ConnectionState, Link, Session, Shared};

// ============================================================================
// Types
// ============================================================================

/// Internal shared state.
struct Inner {
    config: ConnectConfig,
    environment: Arc<dyn HostEnvironment>,
    transports: Arc<dyn TransportFactory>,
    clients: Arc<dyn ClientFactory>,
    store: Arc<dyn SessionStore>,
    shared: Mutex<Shared>,
    state_tx: watch::Sender<ConnectionState>,
}

// ============================================================================
// WalletConnect
// ============================================================================

/// Connects a dApp to a wallet and routes calls to it.
///
/// Cheap to clone; clones share one connection.
///
/// # Example
///
/// ```ignore
/// let wallet = WalletConnect::builder()
///     .wallet_url("http://localhost:5173")
///     .environment(env)
///     .transports(transports)
///     .clients(clients)
///     .mount()?;
///
/// let state = wallet.connect().await;
/// if let Some(error) = state.error {
///     eprintln!("{error}");
/// }
///
/// let balance = wallet.query(rpc::GET_BALANCE, None).await?;
/// wallet.disconnect().await;
/// ```
#[derive(Clone)]
pub struct WalletConnect {
    inner: Arc<Inner>,
}

impl fmt::Debug for WalletConnect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletConnect")
            .field("wallet_url", &self.inner.config.wallet_url.as_str())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// WalletConnect - Constructor
// ============================================================================

impl WalletConnect {
    /// Creates a builder.
    #[inline]
    #[must_use]
    pub fn builder() -> WalletConnectBuilder {
        WalletConnectBuilder::new()
    }

    /// Creates the machine in the disconnected state.
    ///
    /// `is_auto_connecting` starts `false`; it is raised only when the
    /// silent reconnect is actually started.
    pub(crate) fn new(
        config: ConnectConfig,
        environment: Arc<dyn HostEnvironment>,
        transports: Arc<dyn TransportFactory>,
        clients: Arc<dyn ClientFactory>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let shared = Shared::default();
        let (state_tx, _) = watch::channel(shared.snapshot());

        debug!(wallet_url = %config.wallet_url, "WalletConnect created");

        Self {
            inner: Arc::new(Inner {
                config,
                environment,
                transports,
                clients,
                store,
                shared: Mutex::new(shared),
                state_tx,
            }),
        }
    }
}

// ============================================================================
// WalletConnect - State
// ============================================================================

impl WalletConnect {
    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.state_tx.borrow().clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ConnectConfig {
        &self.inner.config
    }

    /// Returns the wallet session identifier of the live connection.
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        match &self.inner.shared.lock().link {
            Link::Connected(session) => Some(session.session_id.clone()),
            _ => None,
        }
    }

    /// Locks the shared state.
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner.shared.lock()
    }

    /// Publishes a snapshot taken under the lock.
    fn publish(&self, shared: &Shared) {
        self.inner.state_tx.send_replace(shared.snapshot());
    }
}

// ============================================================================
// WalletConnect - Connect
// ============================================================================

impl WalletConnect {
    /// Connects with the best strategy for the environment.
    ///
    /// Priority: iframe, then extension, then popup. Failures never escape:
    /// they end up in [`ConnectionState::error`]. Returns the resulting
    /// state.
    pub async fn connect(&self) -> ConnectionState {
        let strategy = Strategy::detect(self.inner.environment.as_ref());
        self.run(strategy).await
    }

    /// Connects through the browser extension.
    pub async fn connect_via_extension(&self) -> ConnectionState {
        self.run(Strategy::Extension).await
    }

    /// Connects through a popup window.
    ///
    /// An open popup is focused and reused rather than reopened.
    pub async fn connect_via_popup(&self) -> ConnectionState {
        self.run(Strategy::Popup).await
    }

    /// Runs one attempt with the given strategy.
    async fn run(&self, strategy: Strategy) -> ConnectionState {
        let Some(epoch) = self.begin(strategy) else {
            return self.state();
        };

        debug!(%strategy, epoch, "Connecting");

        let result = match strategy {
            Strategy::Iframe => self.run_iframe(epoch).await,
            Strategy::Extension => self.run_extension(epoch).await,
            Strategy::Popup => self.run_popup(epoch).await,
        };

        self.finish(epoch, result)
    }

    /// Enters `Connecting`, or returns `None` if an attempt is in flight.
    fn begin(&self, strategy: Strategy) -> Option<u64> {
        let mut shared = self.lock();

        if shared.link.is_connecting() {
            warn!(%strategy, "Connect ignored: {}", Error::ConnectInProgress);
            return None;
        }

        // Keep the previous transport so the attempt destroys it right
        // before installing its own.
        let transport = shared.link.take().into_transport();
        shared.link = Link::Connecting { strategy, transport };
        shared.error = None;
        shared.epoch += 1;

        let epoch = shared.epoch;
        self.publish(&shared);
        Some(epoch)
    }

    /// Iframe: talk to the parent window.
    async fn run_iframe(&self, epoch: u64) -> Result<Session> {
        self.destroy_previous_transport(epoch);
        let transport = self.inner.transports.iframe()?;
        self.install_transport(epoch, &transport)?;

        let client = self.create_client(&transport, None, false)?;
        let result = client.connect().await?;
        Ok(Session::new(Strategy::Iframe, transport, client, result))
    }

    /// Extension: talk through the extension bridge.
    async fn run_extension(&self, epoch: u64) -> Result<Session> {
        self.destroy_previous_transport(epoch);
        let transport = self.inner.transports.extension()?;
        self.install_transport(epoch, &transport)?;

        let client = self.create_client(&transport, None, false)?;
        let result = client.connect().await?;
        Ok(Session::new(Strategy::Extension, transport, client, result))
    }

    /// Popup: open → destroy old transport → new transport → wait ready →
    /// client with resume hint → handshake.
    async fn run_popup(&self, epoch: u64) -> Result<Session> {
        // Listen before the window exists so an early announcement counts.
        let ready = HostReadyWaiter::register(self.inner.environment.as_ref());

        let popup = self.open_popup()?;
        self.destroy_previous_transport(epoch);

        let target_origin = self.inner.config.target_origin();
        let transport = self.inner.transports.popup(&popup, &target_origin)?;
        self.install_transport(epoch, &transport)?;

        ready.wait(self.inner.config.host_ready_timeout).await?;

        let resume = self.inner.store.session_id().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read persisted session");
            None
        });
        debug!(resume = resume.is_some(), "Popup host ready");

        let client = self.create_client(&transport, resume, false)?;
        let result = client.connect().await?;
        Ok(Session::new(Strategy::Popup, transport, client, result))
    }

    /// Returns the live popup, focused, or opens a new one.
    fn open_popup(&self) -> Result<PopupWindowRef> {
        let existing = self.lock().popup.as_ref().and_then(PopupWindowRef::live).cloned();
        if let Some(popup) = existing {
            debug!("Reusing open popup");
            popup.focus();
            return Ok(popup);
        }

        let url = self.inner.config.popup_url(&self.inner.environment.origin());
        let window = self
            .inner
            .environment
            .open_window(&url, POPUP_WINDOW_NAME, &popup_features())
            .ok_or(Error::PopupBlocked)?;

        debug!(url = %url, "Popup opened");

        let popup = PopupWindowRef::new(window);
        self.lock().popup = Some(popup.clone());
        Ok(popup)
    }

    /// Destroys the transport still held by the attempt, if any.
    fn destroy_previous_transport(&self, epoch: u64) {
        let previous = {
            let mut shared = self.lock();
            let current = shared.epoch == epoch;
            match &mut shared.link {
                Link::Connecting { transport, .. } if current => transport.take(),
                _ => None,
            }
        };

        if let Some(previous) = previous {
            debug!(id = %previous.id(), "Destroying previous transport");
            previous.destroy();
        }
    }

    /// Hands a new transport to the attempt.
    ///
    /// A superseded attempt destroys the transport instead.
    fn install_transport(&self, epoch: u64, transport: &Arc<dyn Transport>) -> Result<()> {
        let displaced = {
            let mut shared = self.lock();
            let current = shared.epoch == epoch;
            match &mut shared.link {
                Link::Connecting { transport: slot, .. } if current => {
                    Ok(slot.replace(Arc::clone(transport)))
                }
                _ => Err(()),
            }
        };

        match displaced {
            Ok(displaced) => {
                if let Some(displaced) = displaced {
                    displaced.destroy();
                }
                debug!(id = %transport.id(), "Transport installed");
                Ok(())
            }
            Err(()) => {
                debug!(id = %transport.id(), "Attempt superseded, dropping transport");
                transport.destroy();
                Err(Error::ConnectionClosed)
            }
        }
    }

    /// Creates a client for the transport.
    fn create_client(
        &self,
        transport: &Arc<dyn Transport>,
        resume_session_id: Option<SessionId>,
        silent: bool,
    ) -> Result<Arc<dyn Client>> {
        self.inner.clients.create(ClientOptions {
            transport: Arc::clone(transport),
            dapp: self.inner.config.dapp.clone(),
            resume_session_id,
            silent,
        })
    }

    /// Leaves `Connecting` with the attempt's outcome.
    fn finish(&self, epoch: u64, result: Result<Session>) -> ConnectionState {
        let mut orphan = None;

        let snapshot = {
            let mut shared = self.lock();

            if shared.epoch != epoch || !shared.link.is_connecting() {
                debug!(epoch, "Attempt superseded, discarding outcome");
                if let Ok(session) = result {
                    orphan = Some(session.transport);
                }
            } else {
                match result {
                    Ok(session) => {
                        info!(strategy = %session.strategy, transport = %session.transport.id(), "Connected");
                        if session.strategy == Strategy::Popup
                            && let Err(e) = self.inner.store.save_session_id(&session.session_id)
                        {
                            warn!(error = %e, "Failed to persist session");
                        }
                        shared.link = Link::Connected(session);
                        shared.error = None;
                    }
                    Err(e) => {
                        warn!(error = %e, "Connection failed");
                        orphan = shared.link.take().into_transport();
                        shared.error = Some(e.to_string());
                    }
                }
                self.publish(&shared);
            }

            shared.snapshot()
        };

        if let Some(transport) = orphan {
            transport.destroy();
        }

        snapshot
    }
}

// ============================================================================
// WalletConnect - Silent Reconnect
// ============================================================================

impl WalletConnect {
    /// Tries to restore a previously approved extension session without UI.
    ///
    /// Runs at most once per instance, and only outside a frame with an
    /// extension present. Failure is expected on a first visit and is never
    /// reported as an error.
    pub async fn auto_connect(&self) {
        if let Some(epoch) = self.begin_auto_connect() {
            self.run_auto_connect(epoch).await;
        }
    }

    /// Raises `is_auto_connecting` if the silent reconnect should run.
    ///
    /// Returns the epoch the attempt belongs to.
    pub(crate) fn begin_auto_connect(&self) -> Option<u64> {
        let eligible = !is_in_iframe(self.inner.environment.as_ref())
            && has_extension(self.inner.environment.as_ref());

        let mut shared = self.lock();
        if shared.auto_connect_attempted {
            return None;
        }
        shared.auto_connect_attempted = true;

        if !eligible {
            debug!("Silent reconnect skipped");
            return None;
        }

        shared.auto_connecting = true;
        self.publish(&shared);
        Some(shared.epoch)
    }

    /// Runs a silent reconnect started by [`begin_auto_connect`](Self::begin_auto_connect).
    pub(crate) async fn run_auto_connect(&self, epoch: u64) {
        debug!("Silent reconnect started");
        let outcome = self.silent_handshake().await;

        let mut orphan = None;
        {
            let mut shared = self.lock();
            shared.auto_connecting = false;

            match outcome {
                Ok(session)
                    if shared.epoch == epoch && matches!(shared.link, Link::Disconnected) =>
                {
                    info!(transport = %session.transport.id(), "Silent reconnect restored session");
                    shared.link = Link::Connected(session);
                }
                Ok(session) => {
                    debug!("Silent reconnect superseded by user action");
                    orphan = Some(session.transport);
                }
                Err((e, transport)) => {
                    debug!(error = %e, "Silent reconnect declined");
                    orphan = transport;
                }
            }

            self.publish(&shared);
        }

        if let Some(transport) = orphan {
            transport.destroy();
        }
    }

    /// Extension handshake with the approval UI suppressed.
    async fn silent_handshake(
        &self,
    ) -> std::result::Result<Session, (Error, Option<Arc<dyn Transport>>)> {
        let transport = self.inner.transports.extension().map_err(|e| (e, None))?;

        let client = match self.create_client(&transport, None, true) {
            Ok(client) => client,
            Err(e) => return Err((e, Some(transport))),
        };

        match client.connect().await {
            Ok(result) => Ok(Session::new(Strategy::Extension, transport, client, result)),
            Err(e) => Err((e, Some(transport))),
        }
    }
}

// ============================================================================
// WalletConnect - Disconnect
// ============================================================================

impl WalletConnect {
    /// Ends the session. Never fails.
    ///
    /// The popup and the persisted session id are released before the new
    /// state is published, so a connect started while the wallet is being
    /// notified starts from a clean slate. The wallet is notified
    /// best-effort; the transport is destroyed afterwards.
    pub async fn disconnect(&self) {
        let link = {
            let mut shared = self.lock();
            shared.epoch += 1;
            shared.error = None;
            let link = shared.link.take();

            if let Some(popup) = shared.popup.take() {
                popup.close();
            }
            if let Err(e) = self.inner.store.clear_session_id() {
                warn!(error = %e, "Failed to clear persisted session");
            }

            self.publish(&shared);
            link
        };

        if let Link::Connected(session) = &link {
            match timeout(self.inner.config.disconnect_timeout, session.client.disconnect()).await
            {
                Ok(Ok(())) => debug!("Wallet notified of disconnect"),
                Ok(Err(e)) => debug!(error = %e, "Disconnect notification failed"),
                Err(_) => warn!(
                    timeout_ms = self.inner.config.disconnect_timeout.as_millis() as u64,
                    "Disconnect notification timed out"
                ),
            }
        }

        if let Some(transport) = link.into_transport() {
            transport.destroy();
        }

        info!("Disconnected");
    }
}

// ============================================================================
// WalletConnect - Calls
// ============================================================================

impl WalletConnect {
    /// Sends a read-only query.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] without a live client
    /// - [`Error::PopupClosed`] if the popup was closed (session torn down)
    /// - whatever the client returns, unchanged
    pub async fn query(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let client = self.ensure_client()?;
        client.query(method, params).await
    }

    /// Sends a query and deserializes the result.
    pub async fn query_as<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T> {
        let value = self.query(method, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Sends an intent. Sent at most once: never retried here.
    ///
    /// # Errors
    ///
    /// Same as [`query`](Self::query).
    pub async fn intent(&self, action: &str, params: Value) -> Result<Value> {
        let client = self.ensure_client()?;
        client.intent(action, params).await
    }

    /// Sends an intent and deserializes the result.
    pub async fn intent_as<T: DeserializeOwned>(&self, action: &str, params: Value) -> Result<T> {
        let value = self.intent(action, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Subscribes to a wallet event.
    ///
    /// # Errors
    ///
    /// Fails immediately with [`Error::NotConnected`] or
    /// [`Error::PopupClosed`].
    pub fn on(
        &self,
        event: &str,
        handler: impl Fn(Value) + Send + Sync + 'static,
    ) -> Result<Subscription> {
        let client = self.ensure_client()?;
        Ok(client.on(event, Arc::new(handler)))
    }

    /// Returns the live client.
    ///
    /// For popup sessions the popup is re-checked first; a closed popup
    /// tears the session down and fails with [`Error::PopupClosed`].
    fn ensure_client(&self) -> Result<Arc<dyn Client>> {
        let mut shared = self.lock();

        let (strategy, client) = match &shared.link {
            Link::Connected(session) => (session.strategy, Arc::clone(&session.client)),
            _ => return Err(Error::NotConnected),
        };

        if strategy != Strategy::Popup
            || shared.popup.as_ref().and_then(PopupWindowRef::live).is_some()
        {
            return Ok(client);
        }

        let link = shared.link.take();
        shared.popup = None;
        shared.error = Some(Error::PopupClosed.to_string());
        shared.epoch += 1;
        self.publish(&shared);
        drop(shared);

        info!("Wallet popup closed, session torn down");

        if let Some(transport) = link.into_transport() {
            transport.destroy();
        }
        if let Err(e) = self.inner.store.clear_session_id() {
            warn!(error = %e, "Failed to clear persisted session");
        }

        Err(Error::PopupClosed)
    }
}

// ============================================================================
// Tests
// ============================================================================
