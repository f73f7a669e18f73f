//! Cloudflare published IP list source
//!
//! Cloudflare publishes its edge IP ranges as plain-text CIDR lists, one
//! network per line, at well-known URLs. This backend fetches both the IPv4
//! and IPv6 lists and returns them merged.
//!
//! The property bag accepts optional `ipv4_url` / `ipv6_url` overrides,
//! mainly for tests and mirrors; with an empty bag the official endpoints
//! are used.

use ipnetwork::IpNetwork;
use std::time::Duration;
use tracing::debug;

use crate::core::error::{Error, Result};
use crate::core::rule::{Source, SourceType};

/// Official URL of the IPv4 edge range list
pub const IPV4_LIST_URL: &str = "https://www.cloudflare.com/ips-v4";
/// Official URL of the IPv6 edge range list
pub const IPV6_LIST_URL: &str = "https://www.cloudflare.com/ips-v6";

/// Timeout for a single list fetch. Generous: the lists are tiny, this only
/// bounds a hung connection.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A [`Source`] backed by Cloudflare's published edge IP ranges.
pub struct CloudflareSource {
    client: reqwest::blocking::Client,
    ipv4_url: String,
    ipv6_url: String,
}

impl CloudflareSource {
    /// Constructs the source from its configuration property bag.
    pub fn from_config(extra: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let ipv4_url = url_override(extra, "ipv4_url")?.unwrap_or_else(|| IPV4_LIST_URL.to_string());
        let ipv6_url = url_override(extra, "ipv6_url")?.unwrap_or_else(|| IPV6_LIST_URL.to_string());

        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            ipv4_url,
            ipv6_url,
        })
    }

    fn fetch_list(&self, url: &str) -> Result<Vec<IpNetwork>> {
        let body = self
            .client
            .get(url)
            .send()?
            .error_for_status()?
            .text()?;

        let networks = parse_ip_list(&body)?;
        debug!(url, count = networks.len(), "fetched ip list");
        Ok(networks)
    }
}

impl Source for CloudflareSource {
    fn ip_addresses(&self) -> Result<Vec<IpNetwork>> {
        let mut networks = self.fetch_list(&self.ipv4_url)?;
        networks.extend(self.fetch_list(&self.ipv6_url)?);
        Ok(networks)
    }

    fn source_type(&self) -> SourceType {
        SourceType::Cloudflare
    }
}

/// Parses a plain-text list of networks, one per line.
///
/// Blank lines and `#` comment lines are skipped; anything else must parse
/// as an address or CIDR network.
pub fn parse_ip_list(body: &str) -> Result<Vec<IpNetwork>> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| line.parse::<IpNetwork>().map_err(Error::from))
        .collect()
}

fn url_override(
    extra: &serde_json::Map<String, serde_json::Value>,
    key: &'static str,
) -> Result<Option<String>> {
    match extra.get(key) {
        None => Ok(None),
        Some(serde_json::Value::String(url)) => Ok(Some(url.clone())),
        Some(_) => Err(Error::InvalidValue(key)),
    }
}
