//! Health classification: maps a client's state entry and the server's own
//! cached public IP to one of four fixed statuses.

#![forbid(unsafe_code)]

mod country;

pub use country::normalize_country;

use serde::{Deserialize, Serialize};
use vpn_proto::ClientStateEntry;

/// One of the four fixed health statuses a client can be in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthStatus {
    Secure,
    DnsLeak,
    DnsUndetectable,
    VpnBypass,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Secure => write!(f, "secure"),
            Self::DnsLeak => write!(f, "dns-leak"),
            Self::DnsUndetectable => write!(f, "dns-undetectable"),
            Self::VpnBypass => write!(f, "vpn-bypass"),
        }
    }
}

/// Classify a single client, given the server's own cached public IP.
///
/// First matching rule wins, in this fixed order:
/// 1. `vpn-bypass` — the client's observed IP equals the server's own IP,
///    or the client never resolved a usable IP at all.
/// 2. `dns-leak` — the DNS egress country disagrees with the IP's country.
/// 3. `dns-undetectable` — the DNS probe produced no location at all.
/// 4. `secure` — otherwise.
pub fn classify(entry: &ClientStateEntry, server_ip: &str) -> HealthStatus {
    if entry.ip == server_ip || entry.ip.eq_ignore_ascii_case("unknown") {
        return HealthStatus::VpnBypass;
    }

    if entry.dns_loc.eq_ignore_ascii_case("unknown") {
        return HealthStatus::DnsUndetectable;
    }

    if !entry.country.eq_ignore_ascii_case("unknown") {
        let country_code = normalize_country(&entry.country);
        let dns_code = normalize_country(&entry.dns_loc);
        if let (Some(a), Some(b)) = (country_code, dns_code) {
            if a != b {
                return HealthStatus::DnsLeak;
            }
        }
    }

    HealthStatus::Secure
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(ip: &str, country: &str, dns_loc: &str) -> ClientStateEntry {
        ClientStateEntry {
            last_seen: Utc::now(),
            ip: ip.to_string(),
            location: String::new(),
            provider: "Unknown".into(),
            country: country.to_string(),
            city: "Unknown".into(),
            region: "Unknown".into(),
            timezone: "Unknown".into(),
            dns_loc: dns_loc.to_string(),
            dns_colo: "Unknown".into(),
            client_version: "Unknown".into(),
        }
    }

    const SERVER_IP: &str = "79.116.8.43";

    #[test]
    fn classifier_table_from_specification() {
        assert_eq!(
            classify(&entry("79.116.8.43", "GB", "GB"), SERVER_IP),
            HealthStatus::VpnBypass
        );
        assert_eq!(
            classify(&entry("unknown", "GB", "GB"), SERVER_IP),
            HealthStatus::VpnBypass
        );
        assert_eq!(
            classify(&entry("91.203.5.146", "GB", "GB"), SERVER_IP),
            HealthStatus::Secure
        );
        assert_eq!(
            classify(&entry("91.203.5.146", "GB", "US"), SERVER_IP),
            HealthStatus::DnsLeak
        );
        assert_eq!(
            classify(&entry("91.203.5.146", "Romania", "RO"), SERVER_IP),
            HealthStatus::Secure
        );
        assert_eq!(
            classify(&entry("91.203.5.146", "GB", "Unknown"), SERVER_IP),
            HealthStatus::DnsUndetectable
        );
    }

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(HealthStatus::Secure.to_string(), "secure");
        assert_eq!(HealthStatus::DnsLeak.to_string(), "dns-leak");
        assert_eq!(HealthStatus::DnsUndetectable.to_string(), "dns-undetectable");
        assert_eq!(HealthStatus::VpnBypass.to_string(), "vpn-bypass");
    }
}
