//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Init logging → Init metrics (optional)
//!
//! Controller (controller.rs):
//!     start(): Stopped → Starting → bind → new bridge → serve → Running
//!     stop():  signal shutdown → cancel pending → drain → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → binary calls stop()
//! ```
//!
//! # Design Decisions
//! - No retry on bind failure; the caller decides
//! - Stop order: stop accepting, then cancel pending, then drain
//! - Draining has a deadline; stragglers are aborted

pub mod controller;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use controller::{ConnectResult, LifecycleState, LocalServer, Responder};
pub use shutdown::{Shutdown, ShutdownListener};
