//! Popup window handle.
//!
//! The user can close the popup at any moment, so the handle is never
//! trusted: [`PopupWindowRef::live`] re-reads `closed` on every access.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

// ============================================================================
// Constants
// ============================================================================

/// Window name; reused so browsers refocus instead of spawning duplicates.
pub const POPUP_WINDOW_NAME: &str = "sphere-wallet";

/// Popup width in pixels.
pub const POPUP_WIDTH: u32 = 420;

/// Popup height in pixels.
pub const POPUP_HEIGHT: u32 = 650;

/// Returns the window feature string passed to the open call.
#[must_use]
pub fn popup_features() -> String {
    format!("width={POPUP_WIDTH},height={POPUP_HEIGHT}")
}

// ============================================================================
// PopupWindow
// ============================================================================

/// A window this crate opened but does not own.
pub trait PopupWindow: Send + Sync {
    /// Returns `true` once the window has been closed.
    fn is_closed(&self) -> bool;

    /// Brings the window to the front.
    fn focus(&self);

    /// Closes the window.
    fn close(&self);
}

// ============================================================================
// PopupWindowRef
// ============================================================================

/// Shared reference to an opened popup window.
#[derive(Clone)]
pub struct PopupWindowRef {
    window: Arc<dyn PopupWindow>,
}

impl PopupWindowRef {
    /// Wraps a window returned by the open call.
    #[inline]
    #[must_use]
    pub fn new(window: Arc<dyn PopupWindow>) -> Self {
        Self { window }
    }

    /// Returns `self` only while the window is still open.
    #[inline]
    #[must_use]
    pub fn live(&self) -> Option<&Self> {
        (!self.window.is_closed()).then_some(self)
    }

    /// Returns `true` while the window is open.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.window.is_closed()
    }

    /// Brings the window to the front.
    #[inline]
    pub fn focus(&self) {
        self.window.focus();
    }

    /// Closes the window unless the user already did.
    pub fn close(&self) {
        if self.is_open() {
            self.window.close();
        }
    }

    /// Returns the underlying window, for transports that post to it.
    #[inline]
    #[must_use]
    pub fn window(&self) -> &Arc<dyn PopupWindow> {
        &self.window
    }
}

impl fmt::Debug for PopupWindowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupWindowRef")
            .field("open", &self.is_open())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeWindow {
        closed: AtomicBool,
        focused: AtomicUsize,
        close_calls: AtomicUsize,
    }

    impl PopupWindow for FakeWindow {
        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }

        fn focus(&self) {
            self.focused.fetch_add(1, Ordering::SeqCst);
        }

        fn close(&self) {
            self.close_calls.fetch_add(1, Ordering::SeqCst);
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_features_string() {
        assert_eq!(popup_features(), "width=420,height=650");
    }

    #[test]
    fn test_live_rechecks_every_access() {
        let window = Arc::new(FakeWindow::default());
        let popup = PopupWindowRef::new(window.clone());

        assert!(popup.live().is_some());
        window.closed.store(true, Ordering::SeqCst);
        assert!(popup.live().is_none());
    }

    #[test]
    fn test_close_skips_already_closed_window() {
        let window = Arc::new(FakeWindow::default());
        let popup = PopupWindowRef::new(window.clone());

        popup.close();
        popup.close();
        assert_eq!(window.close_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_focus_forwards() {
        let window = Arc::new(FakeWindow::default());
        let popup = PopupWindowRef::new(window.clone());
        popup.focus();
        assert_eq!(window.focused.load(Ordering::SeqCst), 1);
    }
}
