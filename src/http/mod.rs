//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (one task per connection, axum::serve)
//!     → server.rs (router, CORS and panic layers, preflight short-circuit)
//!     → request.rs (method, path, headers, query, body → InboundRequest)
//!     → bridge (begin_request, await_response)
//!     → response.rs (200 / 408 / 500 JSON, x-request-id)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use response::X_REQUEST_ID;
pub use server::{build_router, AppState, HttpServer};
