//! Connect-address discovery.
//!
//! The listener binds every interface; clients on the same network need the
//! device's own LAN address, which is only used for reporting.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Address reported when no LAN address can be determined.
pub const FALLBACK_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Routable placeholder used to select the outbound interface. Connecting a
/// UDP socket sends nothing.
const PROBE_ADDR: &str = "192.0.2.1:80";

/// Best guess at the address other devices should use to reach us.
///
/// A bound non-wildcard host is reported as is.
pub fn connect_address(bound_host: IpAddr) -> IpAddr {
    if !bound_host.is_unspecified() {
        return bound_host;
    }
    match local_ip() {
        Some(ip) => ip,
        None => {
            tracing::warn!(fallback = %FALLBACK_IP, "Could not determine local IP, using fallback");
            FALLBACK_IP
        }
    }
}

/// The IPv4 address of the interface that routes outbound traffic.
pub fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    socket.connect(PROBE_ADDR).ok()?;
    let ip = socket.local_addr().ok()?.ip();
    if ip.is_unspecified() {
        None
    } else {
        Some(ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specific_host_reported_as_is() {
        let host: IpAddr = "127.0.0.1".parse().unwrap();
        assert_eq!(connect_address(host), host);
    }

    #[test]
    fn wildcard_host_never_reports_wildcard() {
        let ip = connect_address(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert!(!ip.is_unspecified());
    }
}
