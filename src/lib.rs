//! Embedded HTTP listener that forwards each request to an asynchronous
//! external handler and waits, with a deadline, for its answer.

pub mod bridge;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use bridge::{RequestDescriptor, RequestEvents, RequestId};
pub use config::ServerConfig;
pub use error::BridgeError;
pub use lifecycle::{ConnectResult, LifecycleState, LocalServer, Responder};
