//! DNS egress prober: determines which Cloudflare edge a client's DNS
//! traffic resolves through, to detect DNS leaks outside the VPN tunnel.

#![forbid(unsafe_code)]

mod trace;

pub use trace::parse_trace;

use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig};
use hickory_resolver::TokioResolver;
use std::time::Duration;
use tracing::debug;
use vpn_proto::DnsProbeRecord;

const HTTP_FALLBACKS: [&str; 2] = [
    "https://1.1.1.1/cdn-cgi/trace",
    "https://www.cloudflare.com/cdn-cgi/trace",
];

/// Probe the DNS egress path: try a `TXT whoami.cloudflare` query against
/// Cloudflare's resolver first, then fall back to the HTTP trace endpoints.
pub async fn probe(client: &reqwest::Client, timeout: Duration) -> DnsProbeRecord {
    if let Some(record) = probe_dns(timeout).await {
        if !record.loc.is_empty() || !record.colo.is_empty() {
            return record;
        }
    }

    for url in HTTP_FALLBACKS {
        if let Some(record) = probe_http(client, url, timeout).await {
            return record;
        }
    }

    debug!("dns egress probe exhausted all paths, returning empty record");
    DnsProbeRecord::default()
}

async fn probe_dns(timeout: Duration) -> Option<DnsProbeRecord> {
    let cloudflare = NameServerConfigGroup::from_ips_clear(
        &[std::net::IpAddr::V4(std::net::Ipv4Addr::new(1, 1, 1, 1))],
        53,
        true,
    );
    let config = ResolverConfig::from_parts(None, vec![], cloudflare);
    let mut builder = TokioResolver::builder_with_config(config, hickory_resolver::name_server::TokioConnectionProvider::default());
    builder.options_mut().timeout = timeout;
    let resolver = builder.build();

    let lookup = tokio::time::timeout(timeout, resolver.txt_lookup("whoami.cloudflare."))
        .await
        .ok()?
        .ok()?;

    let mut joined = String::new();
    for record in lookup.iter() {
        for chunk in record.txt_data() {
            joined.push_str(&String::from_utf8_lossy(chunk));
            joined.push(' ');
        }
    }
    if joined.trim().is_empty() {
        return None;
    }
    Some(parse_trace(&joined))
}

/// Lightweight reachability check reusing the same trace endpoint, for
/// callers that only need a yes/no answer (e.g. a health probe) rather than
/// a parsed record.
pub async fn probe_reachable(client: &reqwest::Client, timeout: Duration) -> bool {
    client
        .get(HTTP_FALLBACKS[0])
        .timeout(timeout)
        .send()
        .await
        .map(|response| response.status().is_success())
        .unwrap_or(false)
}

async fn probe_http(client: &reqwest::Client, url: &str, timeout: Duration) -> Option<DnsProbeRecord> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .inspect_err(|err| debug!(%url, error = %err, "dns trace http probe failed"))
        .ok()?;
    if !response.status().is_success() {
        return None;
    }
    let body = response.text().await.ok()?;
    Some(parse_trace(&body))
}
