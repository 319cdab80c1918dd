//! LAN address discovery.
//!
//! Shareable links are built from the first non-loopback IPv4 address found on
//! the host's interfaces. Nothing here is cached: interfaces come and go (Wi-Fi
//! roaming, VPNs), so every directory listing asks again.

use std::net::{IpAddr, Ipv4Addr};

use tracing::warn;

/// Host literal used when no usable interface address exists.
pub const FALLBACK_HOST: &str = "localhost";

/// Pick the first address that is IPv4 and not loopback.
///
/// IPv4-mapped IPv6 addresses count as IPv4. Order is whatever the caller
/// supplies; with several qualifying interfaces the first one wins.
pub fn select_lan_address<I>(addrs: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = IpAddr>,
{
    addrs.into_iter().find_map(|addr| {
        if addr.is_loopback() {
            return None;
        }
        match addr {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(v6) => v6.to_ipv4_mapped().filter(|v4| !v4.is_loopback()),
        }
    })
}

/// All addresses currently bound to host interfaces.
///
/// Enumeration failure yields an empty list and a warning.
pub fn host_addresses() -> Vec<IpAddr> {
    match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces.into_iter().map(|iface| iface.ip()).collect(),
        Err(err) => {
            warn!("Failed to enumerate network interfaces: {}", err);
            Vec::new()
        }
    }
}

/// Host part for shareable URLs: a LAN IPv4 address or [`FALLBACK_HOST`].
pub fn resolve_lan_address() -> String {
    host_for(host_addresses())
}

fn host_for(addrs: Vec<IpAddr>) -> String {
    select_lan_address(addrs)
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| FALLBACK_HOST.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv6Addr;

    #[test]
    fn test_skips_loopback() {
        let addrs = vec![
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)),
        ];
        assert_eq!(
            select_lan_address(addrs),
            Some(Ipv4Addr::new(192, 168, 1, 20))
        );
    }

    #[test]
    fn test_skips_ipv6() {
        let addrs = vec![
            IpAddr::V6(Ipv6Addr::LOCALHOST),
            IpAddr::V6("fe80::1".parse().unwrap()),
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)),
        ];
        assert_eq!(select_lan_address(addrs), Some(Ipv4Addr::new(10, 0, 0, 7)));
    }

    #[test]
    fn test_first_qualifying_address_wins() {
        let addrs = vec![
            IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7)),
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)),
        ];
        assert_eq!(select_lan_address(addrs), Some(Ipv4Addr::new(10, 0, 0, 7)));
    }

    #[test]
    fn test_ipv4_mapped_counts_as_ipv4() {
        let mapped = Ipv4Addr::new(172, 16, 3, 4).to_ipv6_mapped();
        assert_eq!(
            select_lan_address(vec![IpAddr::V6(mapped)]),
            Some(Ipv4Addr::new(172, 16, 3, 4))
        );
    }

    #[test]
    fn test_fallback_when_only_loopback() {
        let addrs = vec![
            IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(Ipv6Addr::LOCALHOST),
        ];
        assert_eq!(host_for(addrs), FALLBACK_HOST);
        assert_eq!(host_for(Vec::new()), FALLBACK_HOST);
    }

    #[test]
    fn test_resolve_never_returns_empty() {
        assert!(!resolve_lan_address().is_empty());
    }
}
