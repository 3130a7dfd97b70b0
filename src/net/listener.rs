//! TCP listener binding.
//!
//! # Responsibilities
//! - Bind to the configured host and port
//! - Report bind failures with the address that was attempted

use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;

use crate::config::ListenerConfig;
use crate::error::BridgeError;

/// Bind a TCP listener for the configured host and port.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, BridgeError> {
    let addr_text = config.bind_address();
    let host: IpAddr = config.host.parse().map_err(|e| BridgeError::Bind {
        addr: addr_text.clone(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e),
    })?;
    let addr = SocketAddr::new(host, config.port);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| BridgeError::Bind {
            addr: addr_text,
            source,
        })?;

    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listener bound");
    Ok(listener)
}
