//! Readiness barrier for a freshly opened wallet popup.
//!
//! A [`HostReadyWaiter`] subscribes to the messaging channel when it is
//! registered and unsubscribes when it is dropped, so the listener goes away
//! on success, on timeout and on cancellation alike.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::WindowMessage;

use super::detection::HostEnvironment;

// ============================================================================
// Constants
// ============================================================================

/// Default bound on the readiness wait.
pub const DEFAULT_HOST_READY_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// HostReadyWaiter
// ============================================================================

/// One-shot wait for the readiness announcement.
///
/// Register before opening the popup so an early announcement is not
/// missed, then [`wait`](Self::wait) once the transport exists.
#[derive(Debug)]
pub struct HostReadyWaiter {
    /// Listener on the messaging channel.
    messages: broadcast::Receiver<WindowMessage>,
}

impl HostReadyWaiter {
    /// Registers the listener.
    #[must_use]
    pub fn register(env: &dyn HostEnvironment) -> Self {
        trace!("Registered host-ready listener");
        Self {
            messages: env.messages(),
        }
    }

    /// Waits for the announcement, at most `limit`.
    ///
    /// # Errors
    ///
    /// - [`Error::HostReadyTimeout`] if nothing arrives within `limit`
    /// - [`Error::ConnectionClosed`] if the messaging channel closes
    pub async fn wait(mut self, limit: Duration) -> Result<()> {
        let outcome = timeout(limit, Self::next_ready(&mut self.messages)).await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                debug!(timeout_ms = limit.as_millis() as u64, "Host-ready wait timed out");
                Err(Error::host_ready_timeout(limit.as_millis() as u64))
            }
        }
    }

    /// Reads messages until the readiness tag shows up.
    async fn next_ready(messages: &mut broadcast::Receiver<WindowMessage>) -> Result<()> {
        loop {
            match messages.recv().await {
                Ok(message) if message.is_host_ready() => {
                    debug!(origin = %message.origin, "Host ready");
                    return Ok(());
                }
                Ok(message) => {
                    trace!(origin = %message.origin, kind = ?message.message_type(), "Ignoring message");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Host-ready listener lagged");
                }
                Err(RecvError::Closed) => return Err(Error::ConnectionClosed),
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
