//! Administrator checks.
//!
//! Handlers receive an [`Authorizer`] through shared state and consult it with
//! a [`RequestContext`] built from the connection. Which requests count as
//! "the host" is decided entirely by the implementation.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

use crate::address;

/// Connection facts available to authorization.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Remote socket address, when the server was started with connect info.
    pub peer: Option<SocketAddr>,
    /// `Origin` request header
    pub origin: Option<String>,
    /// `Host` request header
    pub host: Option<String>,
    /// `Sec-Fetch-Site` request header
    pub fetch_site: Option<String>,
}

impl RequestContext {
    pub fn from_peer(peer: SocketAddr) -> Self {
        Self {
            peer: Some(peer),
            ..Self::default()
        }
    }

    /// True when the browser says the request was issued by another site.
    ///
    /// Any page open in the host's browser connects from loopback, so the peer
    /// address alone does not identify the host's own UI.
    pub fn is_cross_site(&self) -> bool {
        if self
            .fetch_site
            .as_deref()
            .is_some_and(|site| site.eq_ignore_ascii_case("cross-site"))
        {
            return true;
        }

        match (&self.origin, &self.host) {
            (Some(origin), Some(host)) => origin_authority(origin) != Some(host.as_str()),
            (Some(_), None) => true,
            _ => false,
        }
    }
}

/// `host[:port]` part of an origin such as `http://192.168.1.20:8080`.
fn origin_authority(origin: &str) -> Option<&str> {
    let (_, rest) = origin.split_once("://")?;
    Some(rest.trim_end_matches('/'))
}

fn header_string(parts: &Parts, name: header::HeaderName) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self {
            peer,
            origin: header_string(parts, header::ORIGIN),
            host: header_string(parts, header::HOST),
            fetch_site: header_string(parts, header::HeaderName::from_static("sec-fetch-site")),
        })
    }
}

pub trait Authorizer: Send + Sync {
    fn is_authorized(&self, ctx: &RequestContext) -> bool;
}

/// Grants access only to requests originating from the host itself: loopback
/// peers, or peers whose address is bound to one of the host's interfaces.
/// Requests a browser marks as cross-site are refused regardless of peer.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostOnly;

impl Authorizer for HostOnly {
    fn is_authorized(&self, ctx: &RequestContext) -> bool {
        if ctx.is_cross_site() {
            return false;
        }
        match ctx.peer {
            Some(peer) => is_host_peer(peer.ip(), &address::host_addresses()),
            None => false,
        }
    }
}

/// Grants access to everyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn is_authorized(&self, _ctx: &RequestContext) -> bool {
        true
    }
}

fn is_host_peer(peer: IpAddr, host_addrs: &[IpAddr]) -> bool {
    let peer = match peer {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(peer),
        v4 => v4,
    };
    peer.is_loopback() || host_addrs.contains(&peer)
}

/// Policy names accepted in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminPolicy {
    #[default]
    Host,
    Open,
}

impl AdminPolicy {
    pub fn authorizer(self) -> Box<dyn Authorizer> {
        match self {
            AdminPolicy::Host => Box::new(HostOnly),
            AdminPolicy::Open => Box::new(AllowAll),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn test_loopback_is_host() {
        assert!(is_host_peer(IpAddr::V4(Ipv4Addr::LOCALHOST), &[]));
        assert!(is_host_peer(IpAddr::V6(Ipv6Addr::LOCALHOST), &[]));
    }

    #[test]
    fn test_own_interface_address_is_host() {
        let own = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));
        assert!(is_host_peer(own, &[own]));
    }

    #[test]
    fn test_mapped_address_is_unwrapped() {
        let own = Ipv4Addr::new(192, 168, 1, 20);
        let mapped = IpAddr::V6(own.to_ipv6_mapped());
        assert!(is_host_peer(mapped, &[IpAddr::V4(own)]));
    }

    #[test]
    fn test_other_lan_device_is_not_host() {
        let own = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20));
        let phone = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 42));
        assert!(!is_host_peer(phone, &[own]));
    }

    #[test]
    fn test_host_only_requires_peer() {
        assert!(!HostOnly.is_authorized(&RequestContext::default()));
        let local = RequestContext::from_peer("127.0.0.1:50000".parse().unwrap());
        assert!(HostOnly.is_authorized(&local));
    }

    #[test]
    fn test_same_origin_request_is_not_cross_site() {
        let ctx = RequestContext {
            origin: Some("http://192.168.1.20:8080".to_string()),
            host: Some("192.168.1.20:8080".to_string()),
            fetch_site: Some("same-origin".to_string()),
            ..RequestContext::from_peer("127.0.0.1:50000".parse().unwrap())
        };
        assert!(!ctx.is_cross_site());
        assert!(HostOnly.is_authorized(&ctx));
    }

    #[test]
    fn test_foreign_origin_is_refused_from_loopback() {
        let ctx = RequestContext {
            origin: Some("http://evil.example".to_string()),
            host: Some("localhost:8080".to_string()),
            ..RequestContext::from_peer("127.0.0.1:50000".parse().unwrap())
        };
        assert!(ctx.is_cross_site());
        assert!(!HostOnly.is_authorized(&ctx));
    }

    #[test]
    fn test_cross_site_fetch_without_origin_is_refused() {
        let ctx = RequestContext {
            fetch_site: Some("cross-site".to_string()),
            ..RequestContext::from_peer("127.0.0.1:50000".parse().unwrap())
        };
        assert!(!HostOnly.is_authorized(&ctx));
    }

    #[test]
    fn test_origin_authority() {
        assert_eq!(origin_authority("http://localhost:8080"), Some("localhost:8080"));
        assert_eq!(origin_authority("null"), None);
    }

    #[test]
    fn test_allow_all() {
        assert!(AllowAll.is_authorized(&RequestContext::default()));
    }

    #[test]
    fn test_policy_parsing() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: AdminPolicy,
        }
        let parsed: Wrapper = toml::from_str("policy = \"open\"").unwrap();
        assert_eq!(parsed.policy, AdminPolicy::Open);
    }
}
