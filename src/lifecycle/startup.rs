//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize logging and, when enabled, the metrics endpoint
//! - Done once per process, before the first `LocalServer::start()`
//!
//! # Design Decisions
//! - A second logging init is reported, not fatal (tests and embedders may
//!   already have a subscriber)
//! - A metrics endpoint that fails to start is logged and skipped

use crate::config::ObservabilityConfig;
use crate::observability::{logging, metrics};

/// Set up process-wide observability from config.
pub fn init_observability(config: &ObservabilityConfig) {
    if let Err(e) = logging::init_logging(config) {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }

    if !config.metrics_enabled {
        return;
    }
    match config.metrics_address.parse() {
        Ok(addr) => {
            if let Err(e) = metrics::init_metrics(addr) {
                tracing::error!(error = %e, "Failed to start metrics endpoint");
            }
        }
        Err(_) => {
            tracing::error!(
                metrics_address = %config.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }
}
