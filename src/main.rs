//! Embedded HTTP Local Server (demo binary)
//!
//! Starts the listener and answers every request from an in-process echo
//! handler, the way an application would from its own event loop.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                 LOCAL SERVER                 │
//!     Client Request    │  ┌─────────┐   ┌─────────┐   ┌─────────────┐ │
//!     ──────────────────┼─▶│   net   │──▶│  http   │──▶│   bridge    │─┼──▶ RequestEvents
//!                       │  │listener │   │ adapter │   │ (pending +  │ │    (external handler)
//!                       │  └─────────┘   └─────────┘   │ correlation)│ │
//!     Client Response   │                ┌─────────┐   │             │ │
//!     ◀─────────────────┼────────────────│response │◀──│             │◀┼─── send_response(id, body)
//!                       │                └─────────┘   └─────────────┘ │
//!                       │  ┌────────────────────────────────────────┐  │
//!                       │  │ config · lifecycle · observability     │  │
//!                       │  └────────────────────────────────────────┘  │
//!                       └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use http_local_server::config::{ensure_valid, load_config, ServerConfig};
use http_local_server::lifecycle::{signals, startup};
use http_local_server::{LocalServer, RequestEvents, Responder};

#[derive(Parser)]
#[command(name = "http-local-server")]
#[command(about = "Embedded HTTP listener answered by an asynchronous handler", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file).
    #[arg(short, long)]
    port: Option<u16>,

    /// Response timeout in milliseconds (overrides the config file).
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Artificial delay before the echo handler answers, in milliseconds.
    #[arg(short, long, default_value_t = 0)]
    delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.port = port;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.bridge.response_timeout_ms = timeout_ms;
    }
    let config = ensure_valid(config)?;

    startup::init_observability(&config.observability);
    tracing::info!("http-local-server v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        port = config.listener.port,
        response_timeout_ms = config.bridge.response_timeout_ms,
        "Configuration loaded"
    );

    let (server, events) = LocalServer::new(config);
    let connect = server.start().await?;
    tracing::info!(ip = %connect.ip, port = connect.port, "Ready for requests");

    tokio::spawn(echo_handler(
        events,
        server.responder(),
        Duration::from_millis(cli.delay_ms),
    ));

    signals::terminate_signal().await;
    server.stop().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Answer each request with its own descriptor.
async fn echo_handler(mut events: RequestEvents, responder: Responder, delay: Duration) {
    while let Some(event) = events.recv().await {
        let responder = responder.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let body = event.to_json().to_string();
            if let Err(e) = responder.send_response(&event.request_id.to_string(), &body) {
                tracing::warn!(request_id = %event.request_id, error = %e, "Echo response dropped");
            }
        });
    }
}
