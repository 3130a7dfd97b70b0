//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check addresses parse before the listener tries to bind them
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>

use std::net::{IpAddr, SocketAddr};

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.host `{0}` is not an IP address")]
    InvalidHost(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::InvalidHost(config.listener.host.clone()));
    }
    if config.listener.shutdown_grace_ms == 0 {
        errors.push(ValidationError::ZeroValue("listener.shutdown_grace_ms"));
    }
    if config.bridge.response_timeout_ms == 0 {
        errors.push(ValidationError::ZeroValue("bridge.response_timeout_ms"));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue("limits.max_body_bytes"));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
