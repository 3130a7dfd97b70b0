//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! start()
//!     → listener.rs (bind host:port, map failures to BridgeError::Bind)
//!     → address.rs (pick the LAN address to report back to the caller)
//!     → Hand the listener to the HTTP layer (axum::serve)
//! ```

pub mod address;
pub mod listener;
