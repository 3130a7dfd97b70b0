//! Request/response correlation subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP adapter builds InboundRequest
//!     → correlation.rs (mint RequestId, register slot)
//!     → pending.rs (RequestId → one-shot slot)
//!     → events.rs (RequestDescriptor sent to the external handler)
//!     → await slot with deadline
//!
//! External handler:
//!     send_response(id, body)
//!     → correlation.rs resolve()
//!     → pending.rs removes slot, wakes the waiting request
//! ```
//!
//! # Design Decisions
//! - One table per running listener, built at start and dropped at stop
//! - A slot is resolved at most once; whoever removes it from the table owns it
//! - Waiting holds no lock; only the table shard is locked for insert/remove
//! - Every waiter cleans up its own entry through a drop guard

pub mod correlation;
pub mod events;
pub mod pending;

pub use correlation::{BridgeStats, CorrelationBridge, PendingResponse, ResponseOutcome};
pub use events::{InboundRequest, RequestDescriptor, RequestEvents};
pub use pending::{PendingTable, RequestId};
