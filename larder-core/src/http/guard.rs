//! SSRF guard: decides whether a user-supplied URL is safe to fetch.

use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use url::{Host, Url};

/// Outcome of checking a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlValidation {
    pub valid: bool,
    /// The parsed URL, when valid.
    pub url: Option<Url>,
    /// Why the URL was rejected.
    pub reason: Option<String>,
    /// Addresses the host resolved to, all of which passed the check. The
    /// fetcher connects to these instead of resolving again. Empty when the
    /// guard did no resolution.
    pub addrs: Vec<SocketAddr>,
}

impl UrlValidation {
    pub fn allowed(url: Url) -> Self {
        Self::allowed_at(url, Vec::new())
    }

    pub fn allowed_at(url: Url, addrs: Vec<SocketAddr>) -> Self {
        Self {
            valid: true,
            url: Some(url),
            reason: None,
            addrs,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            url: None,
            reason: Some(reason.into()),
            addrs: Vec::new(),
        }
    }
}

/// Trait for URL safety checks, enabling fakes in tests.
#[async_trait]
pub trait UrlGuard: Send + Sync {
    async fn validate(&self, raw: &str) -> UrlValidation;
}

/// Parse `raw` and check everything that doesn't need the network.
pub fn check_url_shape(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| format!("Invalid URL: {e}"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("Unsupported URL scheme: {}", url.scheme()));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err("URLs with credentials are not allowed".to_string());
    }
    if url.host().is_none() {
        return Err("URL has no host".to_string());
    }
    Ok(url)
}

/// Production guard: checks the URL shape, then resolves the host and
/// rejects it if any resolved address is not publicly routable.
#[derive(Debug, Clone, Copy, Default)]
pub struct DnsUrlGuard;

impl DnsUrlGuard {
    async fn resolve(url: &Url) -> Result<Vec<SocketAddr>, String> {
        let port = url.port_or_known_default().unwrap_or(80);
        match url.host() {
            Some(Host::Ipv4(ip)) => Ok(vec![SocketAddr::new(IpAddr::V4(ip), port)]),
            Some(Host::Ipv6(ip)) => Ok(vec![SocketAddr::new(IpAddr::V6(ip), port)]),
            Some(Host::Domain(domain)) => {
                if domain.eq_ignore_ascii_case("localhost")
                    || domain.to_ascii_lowercase().ends_with(".localhost")
                {
                    return Err("Local addresses are not allowed".to_string());
                }
                let addrs = tokio::net::lookup_host((domain, port))
                    .await
                    .map_err(|e| format!("Could not resolve host {domain}: {e}"))?;
                Ok(addrs.collect())
            }
            None => Err("URL has no host".to_string()),
        }
    }
}

#[async_trait]
impl UrlGuard for DnsUrlGuard {
    async fn validate(&self, raw: &str) -> UrlValidation {
        let url = match check_url_shape(raw) {
            Ok(url) => url,
            Err(reason) => return UrlValidation::rejected(reason),
        };

        let addrs = match Self::resolve(&url).await {
            Ok(addrs) => addrs,
            Err(reason) => return UrlValidation::rejected(reason),
        };

        if addrs.is_empty() {
            return UrlValidation::rejected("Host did not resolve to any address");
        }
        if let Some(blocked) = addrs.iter().find(|addr| !is_public_ip(addr.ip())) {
            tracing::debug!(url = %url, ip = %blocked.ip(), "rejecting non-public address");
            return UrlValidation::rejected("URL points to a private or reserved address");
        }

        UrlValidation::allowed_at(url, addrs)
    }
}

/// True if `ip` is publicly routable.
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_ipv4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public_ipv4(v4),
            None => is_public_ipv6(v6),
        },
    }
}

fn is_public_ipv4(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    let this_network = a == 0;
    let shared = a == 100 && (b & 0xc0) == 64; // 100.64.0.0/10
    let protocol_assignments = a == 192 && b == 0 && c == 0; // 192.0.0.0/24
    let benchmarking = a == 198 && (b & 0xfe) == 18; // 198.18.0.0/15
    let reserved = a >= 240;

    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_multicast()
        || ip.is_broadcast()
        || ip.is_documentation()
        || this_network
        || shared
        || protocol_assignments
        || benchmarking
        || reserved)
}

fn is_public_ipv6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    let unique_local = (first & 0xfe00) == 0xfc00; // fc00::/7
    let link_local = (first & 0xffc0) == 0xfe80; // fe80::/10
    let documentation = first == 0x2001 && ip.segments()[1] == 0x0db8; // 2001:db8::/32

    !(ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()
        || unique_local
        || link_local
        || documentation)
}

/// Test double: shape checks only, no DNS. Optionally rejects everything.
#[derive(Debug, Clone, Default)]
pub struct FakeUrlGuard {
    deny_reason: Option<String>,
    addrs: Vec<SocketAddr>,
}

impl FakeUrlGuard {
    pub fn allow_all() -> Self {
        Self::default()
    }

    pub fn deny_all(reason: &str) -> Self {
        Self {
            deny_reason: Some(reason.to_string()),
            addrs: Vec::new(),
        }
    }

    /// Allows everything and reports `addrs` as the checked addresses.
    pub fn resolving_to(addrs: Vec<SocketAddr>) -> Self {
        Self {
            deny_reason: None,
            addrs,
        }
    }
}

#[async_trait]
impl UrlGuard for FakeUrlGuard {
    async fn validate(&self, raw: &str) -> UrlValidation {
        if let Some(reason) = &self.deny_reason {
            return UrlValidation::rejected(reason.clone());
        }
        match check_url_shape(raw) {
            Ok(url) => UrlValidation::allowed_at(url, self.addrs.clone()),
            Err(reason) => UrlValidation::rejected(reason),
        }
    }
}
