//! Environment detection for transport selection.
//!
//! Priority order:
//!
//! 1. inside a wallet iframe → post messages to the parent window
//! 2. extension installed → extension bridge
//! 3. standalone page → post messages to a popup window
//!
//! Both detectors are pure reads of the [`HostEnvironment`] and never fail:
//! every inspection error maps to a fixed answer.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

use crate::error::Result;
use crate::protocol::WindowMessage;

use super::popup::PopupWindow;

// ============================================================================
// Types
// ============================================================================

/// Installation check exposed by the extension's global object.
///
/// Returns whatever the extension returns; only `Value::Bool(true)` counts.
pub type InstallCheck = Arc<dyn Fn() -> Result<Value> + Send + Sync>;

/// How the current window relates to its parent and top windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRelation {
    /// `window.parent` is the window itself.
    pub parent_is_self: bool,
    /// `window.self` is `window.top`.
    pub self_is_top: bool,
}

impl FrameRelation {
    /// Relation of a top-level page.
    pub const TOP_LEVEL: Self = Self {
        parent_is_self: true,
        self_is_top: true,
    };

    /// Relation of a page embedded in a frame.
    pub const FRAMED: Self = Self {
        parent_is_self: false,
        self_is_top: false,
    };
}

/// The well-known extension global, as seen by the page.
#[derive(Clone)]
pub enum WalletGlobal {
    /// No such global.
    Missing,
    /// Present but not an object (string, number, ...).
    Primitive(Value),
    /// An object; `is_installed` is `None` when the member is absent or not
    /// callable.
    Object {
        /// The installation check, if callable.
        is_installed: Option<InstallCheck>,
    },
}

impl WalletGlobal {
    /// Object global with a callable installation check.
    #[must_use]
    pub fn with_check(check: impl Fn() -> Result<Value> + Send + Sync + 'static) -> Self {
        Self::Object {
            is_installed: Some(Arc::new(check)),
        }
    }
}

impl fmt::Debug for WalletGlobal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("Missing"),
            Self::Primitive(value) => f.debug_tuple("Primitive").field(value).finish(),
            Self::Object { is_installed } => f
                .debug_struct("Object")
                .field("is_installed", &is_installed.is_some())
                .finish(),
        }
    }
}

// ============================================================================
// HostEnvironment
// ============================================================================

/// The hosting page, injected into the state machine.
///
/// Implemented over `web-sys` in a browser build and by fakes in tests.
pub trait HostEnvironment: Send + Sync {
    /// Compares the window with its parent and top windows.
    ///
    /// Fails when a cross-origin parent refuses access.
    fn frame_relation(&self) -> Result<FrameRelation>;

    /// Looks up the extension global.
    fn wallet_global(&self) -> Result<WalletGlobal>;

    /// Origin of the current page, e.g. `https://dapp.example`.
    fn origin(&self) -> String;

    /// Opens (or refocuses) a named window.
    ///
    /// Returns `None` when the browser refused, typically a pop-up blocker.
    fn open_window(&self, url: &str, name: &str, features: &str) -> Option<Arc<dyn PopupWindow>>;

    /// Subscribes to the cross-window messaging channel.
    ///
    /// Dropping the receiver removes the listener.
    fn messages(&self) -> broadcast::Receiver<WindowMessage>;
}

// ============================================================================
// Detection
// ============================================================================

/// Returns `true` when the page is running inside a frame.
///
/// A failed comparison also yields `true`: only a cross-origin parent
/// refuses access.
#[must_use]
pub fn is_in_iframe(env: &dyn HostEnvironment) -> bool {
    match env.frame_relation() {
        Ok(relation) => !relation.parent_is_self || !relation.self_is_top,
        Err(e) => {
            trace!(error = %e, "Frame comparison failed, assuming cross-origin iframe");
            true
        }
    }
}

/// Returns `true` when the wallet extension is installed and active.
#[must_use]
pub fn has_extension(env: &dyn HostEnvironment) -> bool {
    let global = match env.wallet_global() {
        Ok(global) => global,
        Err(e) => {
            trace!(error = %e, "Extension global lookup failed");
            return false;
        }
    };

    let WalletGlobal::Object {
        is_installed: Some(check),
    } = global
    else {
        return false;
    };

    matches!(check(), Ok(Value::Bool(true)))
}

// ============================================================================
// Tests
// ============================================================================
