//! Wire types and field validation for the VPN Sentinel protocol.
//!
//! Defines the keepalive payload exchanged between client agents and the
//! aggregation server, the canonical state entry the server stores per
//! client, and the pure validation functions applied to every ingested
//! field before it reaches the store.

#![forbid(unsafe_code)]

mod client_id;
mod keepalive;
pub mod validate;

pub use client_id::ClientId;
pub use keepalive::{
    DnsProbeRecord, GeoRecord, InvalidClientId, KeepalivePayload, KeepaliveRecord, LocationFields,
    RawDnsTest, RawKeepalive, ValidatedLocation,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical server-side record for a single client, keyed by [`ClientId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientStateEntry {
    pub last_seen: DateTime<Utc>,
    pub ip: String,
    pub location: String,
    pub provider: String,
    pub country: String,
    pub city: String,
    pub region: String,
    pub timezone: String,
    pub dns_loc: String,
    pub dns_colo: String,
    pub client_version: String,
}

impl ClientStateEntry {
    pub fn from_record(record: &KeepaliveRecord, now: DateTime<Utc>) -> Self {
        Self {
            last_seen: now,
            ip: record.public_ip.clone(),
            location: format!(
                "{}, {}, {}",
                record.location.city, record.location.region, record.location.country
            ),
            provider: record.location.org.clone(),
            country: record.location.country.clone(),
            city: record.location.city.clone(),
            region: record.location.region.clone(),
            timezone: record.location.timezone.clone(),
            dns_loc: record.dns.loc.clone(),
            dns_colo: record.dns.colo.clone(),
            client_version: record.client_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn state_entry_from_record_round_trips_through_json() {
        let record = KeepaliveRecord {
            client_id: ClientId::parse("office-vpn"),
            public_ip: "91.203.5.146".into(),
            location: ValidatedLocation {
                country: "GB".into(),
                city: "London".into(),
                region: "England".into(),
                org: "M247".into(),
                timezone: "Europe/London".into(),
            },
            dns: DnsProbeRecord {
                loc: "GB".into(),
                colo: "LHR".into(),
            },
            client_version: "1.0.0".into(),
        };
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 0, 0, 0).unwrap();
        let entry = ClientStateEntry::from_record(&record, now);
        let json = serde_json::to_string(&entry).unwrap();
        let back: ClientStateEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
        assert_eq!(entry.location, "London, England, GB");
    }
}
