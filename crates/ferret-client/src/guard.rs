//! Outbound target checks for the fetcher.
//!
//! Every URL the fetcher is about to request, the seed and each redirect
//! hop, goes through [`TargetGuard::check`] first.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ferret_core::error::AppError;
use url::{Host, Url};

/// Decides which hosts the fetcher may contact.
#[derive(Debug, Clone, Default)]
pub struct TargetGuard {
    allow_private: bool,
    trusted_hosts: HashSet<String>,
}

impl TargetGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip address checks entirely.
    pub fn allow_private(mut self) -> Self {
        self.allow_private = true;
        self
    }

    /// Exempt one host (name or IP literal) from address checks.
    pub fn trust_host(mut self, host: impl Into<String>) -> Self {
        self.trusted_hosts.insert(host.into().to_ascii_lowercase());
        self
    }

    /// Reject non-http(s) schemes and hosts that are, or resolve to,
    /// reserved addresses.
    pub async fn check(&self, url: &Url) -> Result<(), AppError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::HttpError(format!(
                "Refusing {} URL: only http and https are fetched",
                url.scheme()
            )));
        }

        let host = url
            .host()
            .ok_or_else(|| AppError::HttpError(format!("No host in {url}")))?;

        if self.allow_private || self.is_trusted(url) {
            return Ok(());
        }

        let domain = match host {
            Host::Ipv4(v4) => return refuse_reserved(url, IpAddr::V4(v4)),
            Host::Ipv6(v6) => return refuse_reserved(url, IpAddr::V6(v6)),
            Host::Domain(domain) => domain,
        };

        let port = url.port_or_known_default().unwrap_or(80);
        let resolved: Vec<IpAddr> = tokio::net::lookup_host((domain, port))
            .await
            .map_err(|e| AppError::NetworkError(format!("Cannot resolve {domain}: {e}")))?
            .map(|addr| addr.ip())
            .collect();

        if resolved.is_empty() {
            return Err(AppError::NetworkError(format!("{domain} has no addresses")));
        }
        resolved
            .into_iter()
            .try_for_each(|ip| refuse_reserved(url, ip))
    }

    fn is_trusted(&self, url: &Url) -> bool {
        url.host_str().is_some_and(|host| {
            let host = host.trim_start_matches('[').trim_end_matches(']');
            self.trusted_hosts.contains(&host.to_ascii_lowercase())
        })
    }
}

fn refuse_reserved(url: &Url, ip: IpAddr) -> Result<(), AppError> {
    if is_reserved(ip) {
        return Err(AppError::HttpError(format!(
            "Blocked request to {url}: {ip} is a reserved address"
        )));
    }
    Ok(())
}

/// Addresses a public crawler has no business reaching: loopback, private,
/// link-local (cloud metadata lives there), shared, multicast and the like.
pub fn is_reserved(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_reserved_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_reserved_v4(v4),
            None => is_reserved_v6(v6),
        },
    }
}

fn is_reserved_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_multicast()
        || a == 0
        || (a == 100 && (64..128).contains(&b))
        || (a == 198 && (b == 18 || b == 19))
        || a >= 240
}

fn is_reserved_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    ip.is_unspecified()
        || ip.is_loopback()
        || ip.is_multicast()
        || (first & 0xfe00) == 0xfc00
        || (first & 0xffc0) == 0xfe80
        || (first == 0x2001 && ip.segments()[1] == 0x0db8)
}
