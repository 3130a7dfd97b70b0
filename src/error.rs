//! Error types shared by the bridge, the HTTP adapter and the lifecycle
//! controller.

use crate::bridge::RequestId;

/// Errors surfaced by the local server.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The listener could not bind to the configured address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The external handler did not answer before the deadline.
    #[error("request {0} timed out waiting for a response")]
    Timeout(RequestId),

    /// A response was submitted for an id that is not pending.
    #[error("no pending request for id {0}")]
    UnknownCorrelation(String),

    /// Nobody is consuming request events.
    #[error("request handler is not listening")]
    HandlerMissing,

    /// `start()` was called while a listener is starting or running.
    #[error("server is already running")]
    AlreadyRunning,

    /// The bridge was closed by `stop()`.
    #[error("server is shutting down")]
    Closed,

    /// Freshly minted ids kept colliding with pending ones.
    #[error("could not allocate a unique request id")]
    IdCollision,

    /// A required `send_response` argument was empty.
    #[error("missing {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
