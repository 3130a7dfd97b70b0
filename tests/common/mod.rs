//! Shared utilities for integration testing.

use http_local_server::bridge::RequestDescriptor;
use http_local_server::{LocalServer, RequestEvents, Responder, ServerConfig};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Config for a loopback listener on an OS-assigned port.
pub fn local_config(timeout_ms: u64) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.listener.shutdown_grace_ms = 500;
    config.bridge.response_timeout_ms = timeout_ms;
    config
}

/// Start a server and return it with its event stream and base URL.
pub async fn start_server(timeout_ms: u64) -> (LocalServer, RequestEvents, String) {
    let (server, events) = LocalServer::new(local_config(timeout_ms));
    let connect = server.start().await.unwrap();
    let base_url = format!("http://127.0.0.1:{}", connect.port);
    (server, events, base_url)
}

/// Start a programmable handler.
///
/// `f` decides each answer; `None` leaves the request unanswered.
#[allow(dead_code)]
pub fn start_programmable_handler<F, Fut>(mut events: RequestEvents, responder: Responder, f: F)
where
    F: Fn(RequestDescriptor) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<String>> + Send + 'static,
{
    let f = Arc::new(f);
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let f = f.clone();
            let responder = responder.clone();
            tokio::spawn(async move {
                let id = event.request_id.to_string();
                if let Some(body) = f(event).await {
                    let _ = responder.send_response(&id, &body);
                }
            });
        }
    });
}

/// HTTP client that never goes through a proxy and never pools.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}
