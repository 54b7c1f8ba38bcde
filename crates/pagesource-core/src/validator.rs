//! URL validation and SSRF guard
//!
//! Checks are pure string/address inspection over the parsed URL. Host names are
//! never resolved, so a public name that resolves to a private address (DNS
//! rebinding) passes validation.

use std::net::IpAddr;

use ipnet::IpNet;
use once_cell::sync::Lazy;
use url::{Host, Url};

use crate::error::{FetchError, FetchResult, InvalidUrlReason};

/// Schemes refused outright.
pub const BLOCKED_SCHEMES: &[&str] = &["file", "ftp", "ws", "wss", "data", "javascript"];

/// Schemes a [`FetchTarget`] may carry.
pub const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// One entry of the address deny table.
#[derive(Debug, Clone)]
pub struct BlockedRange {
    pub network: IpNet,
    pub label: &'static str,
}

/// Loopback, RFC1918 and IPv6 unique-local ranges.
pub static BLOCKED_RANGES: Lazy<Vec<BlockedRange>> = Lazy::new(|| {
    [
        ("127.0.0.0/8", "IPv4 loopback"),
        ("10.0.0.0/8", "RFC1918 private"),
        ("172.16.0.0/12", "RFC1918 private"),
        ("192.168.0.0/16", "RFC1918 private"),
        ("::1/128", "IPv6 loopback"),
        ("fc00::/7", "IPv6 unique-local"),
    ]
    .into_iter()
    .map(|(cidr, label)| BlockedRange {
        network: cidr.parse().expect("invalid blocked range"),
        label,
    })
    .collect()
});

/// A validated outbound URL.
///
/// Only [`validate_target`] constructs one, so holding a `FetchTarget` means the
/// scheme is http/https and the host is not an IP literal in [`BLOCKED_RANGES`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    url: String,
    scheme: String,
    host: String,
}

impl FetchTarget {
    /// The URL exactly as the caller supplied it.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Bypasses validation. Lets transport tests point at a local listener.
    #[cfg(test)]
    pub(crate) fn unchecked(url: &str) -> Self {
        let parsed = Url::parse(url).expect("test URL must parse");
        Self {
            url: url.to_string(),
            scheme: parsed.scheme().to_string(),
            host: parsed.host_str().unwrap_or_default().to_string(),
        }
    }
}

/// Return the deny-table entry covering `ip`, if any.
pub fn blocked_range_for(ip: IpAddr) -> Option<&'static BlockedRange> {
    BLOCKED_RANGES.iter().find(|range| range.network.contains(&ip))
}

/// Validate a caller-supplied URL string.
pub fn validate_target(input: &str) -> FetchResult<FetchTarget> {
    let reject = |reason: InvalidUrlReason| {
        tracing::debug!(url = input, %reason, "rejected fetch target");
        FetchError::InvalidUrl {
            url: input.to_string(),
            reason,
        }
    };

    let parsed = Url::parse(input.trim()).map_err(|_| reject(InvalidUrlReason::Malformed))?;

    let scheme = parsed.scheme();
    if BLOCKED_SCHEMES.contains(&scheme) || !ALLOWED_SCHEMES.contains(&scheme) {
        return Err(reject(InvalidUrlReason::UnsupportedProtocol));
    }

    let ip = match parsed.host() {
        None => return Err(reject(InvalidUrlReason::Malformed)),
        Some(Host::Domain(domain)) if domain.is_empty() => {
            return Err(reject(InvalidUrlReason::Malformed));
        }
        Some(Host::Domain(_)) => None,
        Some(Host::Ipv4(v4)) => Some(IpAddr::V4(v4)),
        Some(Host::Ipv6(v6)) => Some(IpAddr::V6(v6)),
    };

    if let Some(range) = ip.and_then(blocked_range_for) {
        tracing::debug!(url = input, range = range.label, "host inside blocked range");
        return Err(reject(InvalidUrlReason::PrivateAddress));
    }

    Ok(FetchTarget {
        url: input.to_string(),
        scheme: scheme.to_string(),
        host: parsed.host_str().unwrap_or_default().to_string(),
    })
}
