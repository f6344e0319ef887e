//! Session store demonstration.
//!
//! Demonstrates:
//! - Persisting a wallet session id to a file store
//! - Reading it back after reopening the store
//! - Clearing it the way `disconnect()` does
//!
//! Usage:
//!   cargo run --example 002_session_store
//!   cargo run --example 002_session_store -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use common::Args;
use sphere_connect::{Error, FileSessionStore, Result, SessionId, SessionStoreExt};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    println!("=== 002: Session Store ===\n");

    let path = std::env::temp_dir().join(format!("sphere-connect-demo-{}.json", std::process::id()));

    // ========================================================================
    // Save
    // ========================================================================

    println!("[1] Saving session id to {}...", path.display());
    let store = FileSessionStore::open(&path)?;
    let session_id =
        SessionId::new("demo-session").ok_or_else(|| Error::storage("empty session id"))?;
    store.save_session_id(&session_id)?;
    println!("    ✓ Saved {session_id}\n");

    // ========================================================================
    // Reopen
    // ========================================================================

    println!("[2] Reopening store...");
    let reopened = FileSessionStore::open(&path)?;
    match reopened.session_id()? {
        Some(restored) => println!("    ✓ Restored {restored}\n"),
        None => println!("    ✗ Nothing restored\n"),
    }

    // ========================================================================
    // Clear
    // ========================================================================

    println!("[3] Clearing session id...");
    reopened.clear_session_id()?;
    println!("    ✓ Cleared (present={})\n", reopened.session_id()?.is_some());

    println!("[Cleanup] Removing {}...", path.display());
    let _ = std::fs::remove_file(&path);
    println!("          ✓ Done");

    Ok(())
}
