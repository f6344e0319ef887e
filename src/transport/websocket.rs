//! WebSocket client transport.
//!
//! Used by dApps outside a browser (CLI tools, services) to reach a wallet
//! that listens on a WebSocket port.
//!
//! # Event Loop
//!
//! The transport spawns a tokio task that handles:
//!
//! - Incoming text frames, parsed as JSON and passed to the message handler
//! - Outgoing frames queued by [`Transport::send`]
//! - Shutdown on [`Transport::destroy`] or remote close

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, from_str, to_string};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::TransportId;

use super::{MessageHandler, Transport};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for the WebSocket opening handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Types
// ============================================================================

type Stream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Installed message handler. Cloned out of the slot before each call.
type SharedHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// Shared message handler slot.
type HandlerSlot = Arc<Mutex<Option<SharedHandler>>>;

/// Internal commands for the event loop.
enum LoopCommand {
    /// Send a frame.
    Send(String),
    /// Close the socket and stop.
    Shutdown,
}

// ============================================================================
// WebSocketTransport
// ============================================================================

/// Client-role WebSocket transport.
///
/// # Example
///
/// ```no_run
/// use sphere_connect::transport::{Transport, WebSocketTransport};
///
/// # async fn example() -> sphere_connect::Result<()> {
/// let transport = WebSocketTransport::connect("ws://localhost:8765").await?;
/// transport.set_message_handler(Box::new(|frame: serde_json::Value| println!("{frame}")));
/// transport.send(serde_json::json!({ "hello": "wallet" }))?;
/// transport.destroy();
/// # Ok(())
/// # }
/// ```
pub struct WebSocketTransport {
    id: TransportId,
    url: Url,
    /// Channel to the event loop.
    command_tx: mpsc::UnboundedSender<LoopCommand>,
    /// Message handler (shared with event loop).
    handler: HandlerSlot,
    /// Set on destroy or remote close.
    closed: Arc<AtomicBool>,
}

impl WebSocketTransport {
    /// Opens a connection to `url`.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if `url` does not parse
    /// - [`Error::Config`] if the scheme is not `ws` or `wss`
    /// - [`Error::Connection`] if the handshake does not finish within 30s
    /// - [`Error::WebSocket`] if the handshake fails
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_timeout(url, CONNECT_TIMEOUT).await
    }

    /// Opens a connection with a custom handshake timeout.
    pub async fn connect_with_timeout(url: &str, limit: Duration) -> Result<Self> {
        let url = Url::parse(url)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "WebSocket URL must use ws:// or wss://, got {}",
                url.scheme()
            )));
        }

        debug!(url = %url, "Connecting WebSocket transport");

        let (stream, _) = timeout(limit, connect_async(url.as_str()))
            .await
            .map_err(|_| {
                Error::connection(format!(
                    "WebSocket handshake with {url} timed out after {}ms",
                    limit.as_millis()
                ))
            })??;

        let transport = Self::from_stream(url, stream);
        info!(id = %transport.id, url = %transport.url, "WebSocket transport connected");
        Ok(transport)
    }

    /// Wraps an established stream and spawns the event loop.
    fn from_stream(url: Url, stream: Stream) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let handler: HandlerSlot = Arc::new(Mutex::new(None));
        let closed = Arc::new(AtomicBool::new(false));
        let id = TransportId::generate();

        tokio::spawn(Self::run_event_loop(
            id,
            stream,
            command_rx,
            Arc::clone(&handler),
            Arc::clone(&closed),
        ));

        Self {
            id,
            url,
            command_tx,
            handler,
            closed,
        }
    }

    /// Returns the remote URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop(
        id: TransportId,
        stream: Stream,
        mut command_rx: mpsc::UnboundedReceiver<LoopCommand>,
        handler: HandlerSlot,
        closed: Arc<AtomicBool>,
    ) {
        let (mut ws_write, mut ws_read) = stream.split();

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            Self::dispatch(&text, &handler);
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!(%id, "WebSocket closed by remote");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(%id, error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!(%id, "WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(LoopCommand::Send(json)) => {
                            if let Err(e) = ws_write.send(Message::Text(json.into())).await {
                                warn!(%id, error = %e, "Failed to send frame");
                                break;
                            }
                            trace!(%id, "Frame sent");
                        }

                        Some(LoopCommand::Shutdown) | None => {
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        closed.store(true, Ordering::SeqCst);
        debug!(%id, "Event loop terminated");
    }

    /// Parses a text frame and hands it to the handler.
    fn dispatch(text: &str, handler: &HandlerSlot) {
        match from_str::<Value>(text) {
            Ok(frame) => {
                // Lock released before the call; handlers may re-enter the transport.
                let handler = handler.lock().clone();
                if let Some(handler) = handler {
                    handler(frame);
                }
            }
            Err(e) => warn!(error = %e, "Dropping non-JSON frame"),
        }
    }
}

impl Transport for WebSocketTransport {
    fn id(&self) -> TransportId {
        self.id
    }

    fn send(&self, message: Value) -> Result<()> {
        if self.is_destroyed() {
            return Err(Error::ConnectionClosed);
        }
        let json = to_string(&message)?;
        self.command_tx
            .send(LoopCommand::Send(json))
            .map_err(|_| Error::ConnectionClosed)
    }

    fn set_message_handler(&self, handler: MessageHandler) {
        *self.handler.lock() = Some(Arc::from(handler));
    }

    fn destroy(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(id = %self.id, "Destroying WebSocket transport");
        }
        let _ = self.command_tx.send(LoopCommand::Shutdown);
        self.handler.lock().take();
    }

    fn is_destroyed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.destroy();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(CONNECT_TIMEOUT.as_secs(), 30);
    }

    #[tokio::test]
    async fn test_rejects_non_ws_scheme() {
        let err = WebSocketTransport::connect("http://localhost:8765")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_rejects_unparseable_url() {
        let err = WebSocketTransport::connect("not a url").await.err().unwrap();
        assert!(matches!(err, Error::Url(_)));
    }
}
