//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, request_id field on bridge logs)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (text or JSON lines)
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```

pub mod logging;
pub mod metrics;
