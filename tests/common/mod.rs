//! Shared fakes for integration tests.
//!
//! Each fake records what the state machine did to it so tests can assert
//! on transports created and destroyed, windows opened, and client options.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use sphere_connect::environment::PopupWindow;
use sphere_connect::protocol::WindowMessage;
use sphere_connect::transport::MessageHandler;
use sphere_connect::{
    Client, ClientFactory, ClientOptions, ConnectResult, Error, EventHandler, FrameRelation,
    HostEnvironment, Identity, MemorySessionStore, PermissionScope, Result, SessionId, Strategy,
    Subscription, Transport, TransportFactory, TransportId, WalletConnect, WalletGlobal,
    PopupWindowRef,
};
use tokio::sync::{Notify, broadcast};

pub const PAGE_ORIGIN: &str = "https://dapp.example";
pub const WALLET_URL: &str = "https://wallet.example";

/// Installs a test subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// FakeWindow
// ============================================================================

#[derive(Default)]
pub struct FakeWindow {
    pub closed: AtomicBool,
    pub focus_calls: AtomicUsize,
    pub close_calls: AtomicUsize,
}

impl FakeWindow {
    /// Simulates the user closing the window.
    pub fn close_by_user(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn focus_count(&self) -> usize {
        self.focus_calls.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }
}

impl PopupWindow for FakeWindow {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn focus(&self) {
        self.focus_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// FakeEnv
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenCall {
    pub url: String,
    pub name: String,
    pub features: String,
}

pub struct FakeEnv {
    pub framed: AtomicBool,
    pub frame_error: AtomicBool,
    pub extension: AtomicBool,
    pub block_popups: AtomicBool,
    /// Emit the readiness announcement as soon as a window opens.
    pub announce_on_open: AtomicBool,
    pub opened: Mutex<Vec<OpenCall>>,
    pub windows: Mutex<Vec<Arc<FakeWindow>>>,
    messages: broadcast::Sender<WindowMessage>,
}

impl FakeEnv {
    pub fn top_level() -> Arc<Self> {
        let (messages, _) = broadcast::channel(16);
        Arc::new(Self {
            framed: AtomicBool::new(false),
            frame_error: AtomicBool::new(false),
            extension: AtomicBool::new(false),
            block_popups: AtomicBool::new(false),
            announce_on_open: AtomicBool::new(true),
            opened: Mutex::new(Vec::new()),
            windows: Mutex::new(Vec::new()),
            messages,
        })
    }

    pub fn framed() -> Arc<Self> {
        let env = Self::top_level();
        env.framed.store(true, Ordering::SeqCst);
        env
    }

    pub fn with_extension() -> Arc<Self> {
        let env = Self::top_level();
        env.extension.store(true, Ordering::SeqCst);
        env
    }

    /// Emits a message on the messaging channel.
    pub fn post(&self, message: WindowMessage) {
        let _ = self.messages.send(message);
    }

    /// Emits the readiness announcement.
    pub fn announce_ready(&self) {
        self.post(WindowMessage::host_ready(WALLET_URL));
    }

    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub fn last_window(&self) -> Option<Arc<FakeWindow>> {
        self.windows.lock().last().cloned()
    }

    pub fn listener_count(&self) -> usize {
        self.messages.receiver_count()
    }
}

impl HostEnvironment for FakeEnv {
    fn frame_relation(&self) -> Result<FrameRelation> {
        if self.frame_error.load(Ordering::SeqCst) {
            return Err(Error::environment("cross-origin parent"));
        }
        if self.framed.load(Ordering::SeqCst) {
            Ok(FrameRelation::FRAMED)
        } else {
            Ok(FrameRelation::TOP_LEVEL)
        }
    }

    fn wallet_global(&self) -> Result<WalletGlobal> {
        if self.extension.load(Ordering::SeqCst) {
            Ok(WalletGlobal::with_check(|| Ok(json!(true))))
        } else {
            Ok(WalletGlobal::Missing)
        }
    }

    fn origin(&self) -> String {
        PAGE_ORIGIN.to_string()
    }

    fn open_window(&self, url: &str, name: &str, features: &str) -> Option<Arc<dyn PopupWindow>> {
        self.opened.lock().push(OpenCall {
            url: url.to_string(),
            name: name.to_string(),
            features: features.to_string(),
        });

        if self.block_popups.load(Ordering::SeqCst) {
            return None;
        }

        let window = Arc::new(FakeWindow::default());
        self.windows.lock().push(Arc::clone(&window));

        if self.announce_on_open.load(Ordering::SeqCst) {
            self.announce_ready();
        }

        Some(window)
    }

    fn messages(&self) -> broadcast::Receiver<WindowMessage> {
        self.messages.subscribe()
    }
}

// ============================================================================
// FakeTransport
// ============================================================================

pub struct FakeTransport {
    pub id: TransportId,
    pub strategy: Strategy,
    pub target_origin: Option<String>,
    pub destroyed: AtomicBool,
    pub destroy_calls: AtomicUsize,
    pub sent: Mutex<Vec<Value>>,
    handler: Mutex<Option<MessageHandler>>,
}

impl FakeTransport {
    fn new(strategy: Strategy, target_origin: Option<String>) -> Arc<Self> {
        Arc::new(Self {
            id: TransportId::generate(),
            strategy,
            target_origin,
            destroyed: AtomicBool::new(false),
            destroy_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            handler: Mutex::new(None),
        })
    }
}

impl Transport for FakeTransport {
    fn id(&self) -> TransportId {
        self.id
    }

    fn send(&self, message: Value) -> Result<()> {
        if self.is_destroyed() {
            return Err(Error::ConnectionClosed);
        }
        self.sent.lock().push(message);
        Ok(())
    }

    fn set_message_handler(&self, handler: MessageHandler) {
        *self.handler.lock() = Some(handler);
    }

    fn destroy(&self) {
        self.destroy_calls.fetch_add(1, Ordering::SeqCst);
        self.destroyed.store(true, Ordering::SeqCst);
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }
}

// ============================================================================
// FakeTransportFactory
// ============================================================================

#[derive(Default)]
pub struct FakeTransportFactory {
    pub created: Mutex<Vec<Arc<FakeTransport>>>,
}

impl FakeTransportFactory {
    fn record(&self, transport: Arc<FakeTransport>) -> Result<Arc<dyn Transport>> {
        self.created.lock().push(Arc::clone(&transport));
        Ok(transport)
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }

    /// Transports created and not yet destroyed.
    pub fn live_count(&self) -> usize {
        self.created.lock().iter().filter(|t| !t.is_destroyed()).count()
    }

    pub fn last(&self) -> Option<Arc<FakeTransport>> {
        self.created.lock().last().cloned()
    }

    pub fn get(&self, index: usize) -> Arc<FakeTransport> {
        Arc::clone(&self.created.lock()[index])
    }
}

impl TransportFactory for FakeTransportFactory {
    fn iframe(&self) -> Result<Arc<dyn Transport>> {
        self.record(FakeTransport::new(Strategy::Iframe, None))
    }

    fn extension(&self) -> Result<Arc<dyn Transport>> {
        self.record(FakeTransport::new(Strategy::Extension, None))
    }

    fn popup(&self, _target: &PopupWindowRef, target_origin: &str) -> Result<Arc<dyn Transport>> {
        self.record(FakeTransport::new(Strategy::Popup, Some(target_origin.to_string())))
    }
}

// ============================================================================
// FakeWallet
// ============================================================================

/// How the fake wallet answers a handshake.
#[derive(Debug, Clone)]
pub enum Handshake {
    Approve,
    Reject(String),
}

/// Wallet-side behaviour shared by every client the factory creates.
pub struct FakeWallet {
    pub handshake: Mutex<Handshake>,
    /// Silent handshakes succeed only when the dApp was approved before.
    pub remembers_dapp: AtomicBool,
    /// When set, handshakes wait for a notification before answering.
    pub gate: Mutex<Option<Arc<Notify>>>,
    pub hang_on_disconnect: AtomicBool,
    pub fail_disconnect: AtomicBool,
    pub disconnect_calls: AtomicUsize,
    pub intents: Mutex<Vec<(String, Value)>>,
    pub subscriptions: Mutex<Vec<(u64, String)>>,
    next_subscription: AtomicUsize,
    sessions: AtomicUsize,
}

impl Default for FakeWallet {
    fn default() -> Self {
        Self {
            handshake: Mutex::new(Handshake::Approve),
            remembers_dapp: AtomicBool::new(false),
            gate: Mutex::new(None),
            hang_on_disconnect: AtomicBool::new(false),
            fail_disconnect: AtomicBool::new(false),
            disconnect_calls: AtomicUsize::new(0),
            intents: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            next_subscription: AtomicUsize::new(0),
            sessions: AtomicUsize::new(0),
        }
    }
}

impl FakeWallet {
    /// Makes the next handshakes block until the returned notify fires.
    pub fn hold_handshakes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn release_handshakes(&self) {
        self.gate.lock().take();
    }

    pub fn reject_with(&self, message: &str) {
        *self.handshake.lock() = Handshake::Reject(message.to_string());
    }

    pub fn disconnect_count(&self) -> usize {
        self.disconnect_calls.load(Ordering::SeqCst)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().len()
    }
}

pub fn identity() -> Identity {
    Identity {
        chain_pubkey: "02abc".to_string(),
        l1_address: "alpha1qxyz".to_string(),
        direct_address: Some("DIRECT://00aa".to_string()),
        nametag: Some("alice".to_string()),
    }
}

// ============================================================================
// FakeClient
// ============================================================================

pub struct FakeClient {
    wallet: Arc<FakeWallet>,
    options: ClientOptions,
}

#[async_trait]
impl Client for FakeClient {
    async fn connect(&self) -> Result<ConnectResult> {
        let gate = self.wallet.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.options.silent && !self.wallet.remembers_dapp.load(Ordering::SeqCst) {
            return Err(Error::remote("Not approved"));
        }

        let handshake = self.wallet.handshake.lock().clone();
        match handshake {
            Handshake::Approve => {
                let n = self.wallet.sessions.fetch_add(1, Ordering::SeqCst) + 1;
                let session_id = self
                    .options
                    .resume_session_id
                    .clone()
                    .or_else(|| SessionId::new(format!("session-{n}")))
                    .ok_or(Error::ConnectionClosed)?;

                Ok(ConnectResult {
                    identity: identity(),
                    permissions: vec![
                        PermissionScope::new(PermissionScope::IDENTITY_READ),
                        PermissionScope::new(PermissionScope::BALANCE_READ),
                    ],
                    session_id,
                })
            }
            Handshake::Reject(message) => Err(Error::remote(message)),
        }
    }

    async fn disconnect(&self) -> Result<()> {
        self.wallet.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        if self.wallet.hang_on_disconnect.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.wallet.fail_disconnect.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed);
        }
        Ok(())
    }

    async fn query(&self, method: &str, params: Option<Value>) -> Result<Value> {
        if method == "sphere_fail" {
            return Err(Error::remote("Method not allowed"));
        }
        Ok(json!({ "method": method, "params": params }))
    }

    async fn intent(&self, action: &str, params: Value) -> Result<Value> {
        self.wallet
            .intents
            .lock()
            .push((action.to_string(), params.clone()));
        Ok(json!({ "action": action, "accepted": true }))
    }

    fn on(&self, event: &str, _handler: EventHandler) -> Subscription {
        let id = self.wallet.next_subscription.fetch_add(1, Ordering::SeqCst) as u64;
        self.wallet.subscriptions.lock().push((id, event.to_string()));

        let wallet = Arc::clone(&self.wallet);
        Subscription::new(move || {
            wallet.subscriptions.lock().retain(|(sid, _)| *sid != id);
        })
    }
}

// ============================================================================
// FakeClientFactory
// ============================================================================

#[derive(Debug, Clone)]
pub struct RecordedOptions {
    pub transport: TransportId,
    pub dapp_name: String,
    pub resume_session_id: Option<SessionId>,
    pub silent: bool,
}

#[derive(Default)]
pub struct FakeClientFactory {
    pub wallet: Arc<FakeWallet>,
    pub created: Mutex<Vec<RecordedOptions>>,
}

impl FakeClientFactory {
    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }

    pub fn last_options(&self) -> Option<RecordedOptions> {
        self.created.lock().last().cloned()
    }
}

impl ClientFactory for FakeClientFactory {
    fn create(&self, options: ClientOptions) -> Result<Arc<dyn Client>> {
        self.created.lock().push(RecordedOptions {
            transport: options.transport.id(),
            dapp_name: options.dapp.name.clone(),
            resume_session_id: options.resume_session_id.clone(),
            silent: options.silent,
        });

        Ok(Arc::new(FakeClient {
            wallet: Arc::clone(&self.wallet),
            options,
        }))
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub env: Arc<FakeEnv>,
    pub transports: Arc<FakeTransportFactory>,
    pub clients: Arc<FakeClientFactory>,
    pub store: Arc<MemorySessionStore>,
}

impl Harness {
    pub fn new(env: Arc<FakeEnv>) -> Self {
        init_tracing();
        Self {
            env,
            transports: Arc::new(FakeTransportFactory::default()),
            clients: Arc::new(FakeClientFactory::default()),
            store: Arc::new(MemorySessionStore::new()),
        }
    }

    pub fn wallet(&self) -> &FakeWallet {
        &self.clients.wallet
    }

    pub fn builder(&self) -> sphere_connect::WalletConnectBuilder {
        WalletConnect::builder()
            .wallet_url(WALLET_URL)
            .environment(self.env.clone())
            .transports(self.transports.clone())
            .clients(self.clients.clone())
            .session_store(self.store.clone())
    }

    pub fn build(&self) -> WalletConnect {
        self.builder().build().expect("valid configuration")
    }
}
