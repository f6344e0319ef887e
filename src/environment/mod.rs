//! Hosting environment capabilities.
//!
//! Everything the state machine learns about the page goes through the
//! [`HostEnvironment`] trait, so tests substitute fakes instead of
//! simulating a browser.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HostEnvironment`] | Frame relation, extension global, window opening, messaging |
//! | [`PopupWindowRef`] | Liveness-checked handle to the wallet popup |
//! | [`HostReadyWaiter`] | Bounded wait for the popup's readiness announcement |

// ============================================================================
// Submodules
// ============================================================================

/// Iframe and extension detection.
pub mod detection;

/// Popup window handle.
pub mod popup;

/// Readiness barrier.
pub mod ready;

// ============================================================================
// Re-exports
// ============================================================================

pub use detection::{
    FrameRelation, HostEnvironment, InstallCheck, WalletGlobal, has_extension, is_in_iframe,
};
pub use popup::{POPUP_WINDOW_NAME, PopupWindow, PopupWindowRef, popup_features};
pub use ready::{DEFAULT_HOST_READY_TIMEOUT, HostReadyWaiter};
