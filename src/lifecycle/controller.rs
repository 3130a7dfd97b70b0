//! Lifecycle controller for the embedded listener.
//!
//! # States
//! ```text
//! Stopped → Starting → Running → Stopped
//!              │
//!              └─ bind failure → Stopped (error returned to the caller)
//! ```
//!
//! Each `start()` builds a fresh correlation bridge; `stop()` closes it, so
//! pending requests never leak from one run into the next.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::bridge::events::{self, RequestDescriptor, RequestEvents};
use crate::bridge::CorrelationBridge;
use crate::config::ServerConfig;
use crate::error::BridgeError;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::net::{address, listener};

/// Where clients can reach a started server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectResult {
    pub ip: String,
    pub port: u16,
}

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
    Stopped,
    Starting,
    Running,
}

struct RunningServer {
    bridge: Arc<CorrelationBridge>,
    shutdown: Shutdown,
    task: JoinHandle<Result<(), std::io::Error>>,
    local_addr: SocketAddr,
}

enum ServerState {
    Stopped,
    Starting,
    Running(RunningServer),
}

struct Inner {
    config: ServerConfig,
    events: mpsc::UnboundedSender<RequestDescriptor>,
    state: Mutex<ServerState>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        if let ServerState::Running(running) = state {
            running.shutdown.trigger();
            running.bridge.close();
        }
    }
}

/// Handle to the embedded HTTP listener.
///
/// Cheap to clone; all clones control the same listener.
#[derive(Clone)]
pub struct LocalServer {
    inner: Arc<Inner>,
}

impl LocalServer {
    /// Create a stopped server and the event stream its requests arrive on.
    ///
    /// The returned [`RequestEvents`] is the only consumer of request
    /// events; dropping it makes every bridged request fail with 500.
    pub fn new(config: ServerConfig) -> (Self, RequestEvents) {
        let (tx, events) = events::channel();
        let server = Self {
            inner: Arc::new(Inner {
                config,
                events: tx,
                state: Mutex::new(ServerState::Stopped),
            }),
        };
        (server, events)
    }

    /// Bind the listener and start serving.
    ///
    /// Fails with `AlreadyRunning` unless the server is stopped.
    pub async fn start(&self) -> Result<ConnectResult, BridgeError> {
        {
            let mut state = self.lock_state();
            if !matches!(*state, ServerState::Stopped) {
                tracing::warn!("Start requested while the server is already running");
                return Err(BridgeError::AlreadyRunning);
            }
            *state = ServerState::Starting;
        }

        match self.launch().await {
            Ok(running) => {
                let result = ConnectResult {
                    ip: address::connect_address(running.local_addr.ip()).to_string(),
                    port: running.local_addr.port(),
                };
                *self.lock_state() = ServerState::Running(running);
                tracing::info!(ip = %result.ip, port = result.port, "Server started");
                Ok(result)
            }
            Err(e) => {
                *self.lock_state() = ServerState::Stopped;
                tracing::error!(error = %e, "Failed to start server");
                Err(e)
            }
        }
    }

    async fn launch(&self) -> Result<RunningServer, BridgeError> {
        let config = &self.inner.config;
        let tcp = listener::bind(&config.listener).await?;
        let local_addr = tcp.local_addr()?;

        let bridge = Arc::new(CorrelationBridge::new(
            self.inner.events.clone(),
            config.bridge.response_timeout(),
        ));
        let shutdown = Shutdown::new();
        let server = HttpServer::new(Arc::clone(&bridge), config);
        let task = tokio::spawn(server.run(tcp, shutdown.subscribe()));

        Ok(RunningServer {
            bridge,
            shutdown,
            task,
            local_addr,
        })
    }

    /// Stop accepting connections and time out every pending request.
    ///
    /// Stopping a stopped server is a no-op.
    pub async fn stop(&self) {
        let running = {
            let mut state = self.lock_state();
            match std::mem::replace(&mut *state, ServerState::Stopped) {
                ServerState::Running(running) => running,
                other => {
                    *state = other;
                    return;
                }
            }
        };

        running.shutdown.trigger();
        running.bridge.close();

        let grace = self.inner.config.listener.shutdown_grace();
        let mut task = running.task;
        match tokio::time::timeout(grace, &mut task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => tracing::warn!(error = %e, "HTTP server exited with error"),
            Ok(Err(e)) => tracing::warn!(error = %e, "HTTP server task failed"),
            Err(_) => {
                tracing::warn!(
                    grace_ms = grace.as_millis() as u64,
                    "Connections still open after grace period, aborting"
                );
                task.abort();
            }
        }

        tracing::info!(address = %running.local_addr, "Server stopped");
    }

    /// Answer the request identified by `request_id`.
    ///
    /// Ids that are not pending (never issued, already answered, timed out,
    /// or from a previous run) yield `UnknownCorrelation`.
    pub fn send_response(&self, request_id: &str, body: &str) -> Result<(), BridgeError> {
        if request_id.is_empty() {
            return Err(BridgeError::MissingField("requestId"));
        }
        if body.is_empty() {
            return Err(BridgeError::MissingField("body"));
        }

        match self.current_bridge() {
            Some(bridge) => bridge.resolve(request_id, body),
            None => {
                tracing::warn!(request_id = %request_id, "Response submitted while server is stopped");
                Err(BridgeError::UnknownCorrelation(request_id.to_string()))
            }
        }
    }

    /// A handle that can only submit responses.
    pub fn responder(&self) -> Responder {
        Responder {
            server: self.clone(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        match *self.lock_state() {
            ServerState::Stopped => LifecycleState::Stopped,
            ServerState::Starting => LifecycleState::Starting,
            ServerState::Running(_) => LifecycleState::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Address the listener is bound to, while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.lock_state() {
            ServerState::Running(running) => Some(running.local_addr),
            _ => None,
        }
    }

    /// Number of requests currently waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.current_bridge()
            .map(|bridge| bridge.pending_count())
            .unwrap_or(0)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    fn current_bridge(&self) -> Option<Arc<CorrelationBridge>> {
        match &*self.lock_state() {
            ServerState::Running(running) => Some(Arc::clone(&running.bridge)),
            _ => None,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, ServerState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Response-only view of a [`LocalServer`], for handler tasks.
#[derive(Clone)]
pub struct Responder {
    server: LocalServer,
}

impl Responder {
    pub fn send_response(&self, request_id: &str, body: &str) -> Result<(), BridgeError> {
        self.server.send_response(request_id, body)
    }
}
