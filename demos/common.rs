//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization
//! - A local wallet-side WebSocket endpoint

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, from_str, json};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
    pub url: Option<String>,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
            url: args
                .iter()
                .position(|a| a == "--url")
                .and_then(|i| args.get(i + 1))
                .cloned(),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "sphere_connect=debug"
    } else {
        "sphere_connect=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

/// Starts a local endpoint that answers every JSON-RPC request with a
/// canned identity. Returns its `ws://` URL.
pub async fn spawn_wallet_endpoint() -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        let Ok((stream, _)) = listener.accept().await else {
            return;
        };
        let Ok(mut ws) = accept_async(stream).await else {
            return;
        };

        while let Some(Ok(message)) = ws.next().await {
            let Message::Text(text) = message else {
                continue;
            };
            let Ok(request) = from_str::<Value>(&text) else {
                continue;
            };
            let response = json!({
                "jsonrpc": "2.0",
                "id": request["id"],
                "result": {
                    "chainPubkey": "02a1b2c3",
                    "l1Address": "alpha1qdemo",
                    "directAddress": "DIRECT://demo",
                    "nametag": "demo"
                }
            });
            if ws.send(Message::Text(response.to_string().into())).await.is_err() {
                break;
            }
        }
    });

    Ok(format!("ws://{addr}"))
}
