//! WebSocket transport demonstration.
//!
//! Demonstrates:
//! - Opening a client-role WebSocket transport
//! - Installing a message handler
//! - Sending a JSON-RPC request and reading the reply
//! - Destroying the transport
//!
//! Without `--url` a local wallet endpoint is started in-process.
//!
//! Usage:
//!   cargo run --example 001_websocket_connect
//!   cargo run --example 001_websocket_connect -- --url ws://localhost:8765
//!   cargo run --example 001_websocket_connect -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::time::timeout;

use common::Args;
use sphere_connect::protocol::rpc;
use sphere_connect::{Result, Transport, WebSocketTransport};

// ============================================================================
// Constants
// ============================================================================

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    println!("=== 001: WebSocket Connect ===\n");

    // ========================================================================
    // Setup
    // ========================================================================

    let url = match args.url {
        Some(url) => url,
        None => {
            println!("[Setup] Starting local wallet endpoint...");
            let url = common::spawn_wallet_endpoint().await?;
            println!("        ✓ Listening on {url}\n");
            url
        }
    };

    // ========================================================================
    // Connect
    // ========================================================================

    println!("[1] Connecting to {url}...");
    let transport = WebSocketTransport::connect(&url).await?;
    println!("    ✓ Connected (transport={})\n", transport.id());

    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
    transport.set_message_handler(Box::new(move |frame: Value| {
        let _ = tx.send(frame);
    }));

    // ========================================================================
    // Request
    // ========================================================================

    println!("[2] Sending {}...", rpc::GET_IDENTITY);
    transport.send(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": rpc::GET_IDENTITY,
    }))?;

    match timeout(REPLY_TIMEOUT, rx.recv()).await {
        Ok(Some(reply)) => println!("    ✓ Reply: {reply}\n"),
        Ok(None) => println!("    ✗ Handler dropped before a reply\n"),
        Err(_) => println!("    ✗ No reply within {}ms\n", REPLY_TIMEOUT.as_millis()),
    }

    // ========================================================================
    // Done
    // ========================================================================

    println!("[Cleanup] Destroying transport...");
    transport.destroy();
    println!("          ✓ Destroyed={}", transport.is_destroyed());

    Ok(())
}
