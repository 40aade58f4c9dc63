use crate::{validate, ClientId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned by [`TryFrom<RawKeepalive>`] when the submitted `client_id`
/// contains any character outside `[A-Za-z0-9._-]` or is empty/too long.
/// Unlike every other field, `client_id` is rejected rather than repaired.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid client_id format")]
pub struct InvalidClientId;

/// Canonical geolocation record returned by the geolocation resolver.
///
/// `Unknown` is a sentinel value in every field that suppresses downstream
/// comparisons (e.g. country-vs-DNS-location matching).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoRecord {
    pub ip: String,
    pub country: String,
    pub city: String,
    pub region: String,
    pub org: String,
    pub timezone: String,
    pub source: String,
}

impl GeoRecord {
    pub fn unknown() -> Self {
        Self {
            ip: "unknown".into(),
            country: "Unknown".into(),
            city: "Unknown".into(),
            region: "Unknown".into(),
            org: "Unknown".into(),
            timezone: "Unknown".into(),
            source: "none".into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ip == "unknown" || self.ip.is_empty()
    }
}

/// Result of a DNS egress probe: the Cloudflare edge location and colo code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsProbeRecord {
    pub loc: String,
    pub colo: String,
}

/// The `location` sub-object shared by both keepalive payload shapes.
#[derive(Debug, Clone, Deserialize)]
pub struct LocationFields {
    #[serde(default = "unknown_field")]
    pub country: String,
    #[serde(default = "unknown_field")]
    pub city: String,
    #[serde(default = "unknown_field")]
    pub region: String,
    #[serde(default = "unknown_field")]
    pub org: String,
    #[serde(default = "unknown_field")]
    pub timezone: String,
}

fn unknown_field() -> String {
    "unknown".to_string()
}

/// The nested `dns_test` sub-object in the wire payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDnsTest {
    #[serde(default, rename = "location")]
    pub location: String,
    #[serde(default)]
    pub colo: String,
}

/// The full nested keepalive shape: `location` and `dns_test` are objects.
#[derive(Debug, Clone, Deserialize)]
pub struct NestedKeepalive {
    pub client_id: String,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    pub location: LocationFields,
    pub dns_test: RawDnsTest,
    #[serde(default)]
    pub client_version: Option<String>,
}

/// The flat keepalive shape: location and DNS fields live at the top level.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatKeepalive {
    pub client_id: String,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default = "unknown_field")]
    pub country: String,
    #[serde(default = "unknown_field")]
    pub city: String,
    #[serde(default = "unknown_field")]
    pub region: String,
    #[serde(default = "unknown_field")]
    pub provider: String,
    #[serde(default = "unknown_field")]
    pub timezone: String,
    #[serde(default = "unknown_dns")]
    pub dns_loc: String,
    #[serde(default = "unknown_dns")]
    pub dns_colo: String,
    #[serde(default)]
    pub client_version: Option<String>,
}

fn unknown_dns() -> String {
    "Unknown".to_string()
}

/// A raw, not-yet-validated keepalive body. Accepts either the nested or
/// flat wire shape; serde tries each variant in order and keeps whichever
/// parses. Never retained past the handler boundary — convert immediately
/// to [`KeepaliveRecord`].
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawKeepalive {
    Nested(NestedKeepalive),
    Flat(FlatKeepalive),
}

/// Back-compat alias for the type most callers reach for.
pub type KeepalivePayload = RawKeepalive;

impl RawKeepalive {
    pub fn client_id_raw(&self) -> &str {
        match self {
            Self::Nested(n) => &n.client_id,
            Self::Flat(f) => &f.client_id,
        }
    }
}

/// The canonical, fully-validated form of a keepalive submission, after the
/// nested/flat sum type has been collapsed and every field has passed
/// through [`validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct KeepaliveRecord {
    pub client_id: ClientId,
    pub public_ip: String,
    pub location: ValidatedLocation,
    pub dns: DnsProbeRecord,
    pub client_version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLocation {
    pub country: String,
    pub city: String,
    pub region: String,
    pub org: String,
    pub timezone: String,
}

impl TryFrom<RawKeepalive> for KeepaliveRecord {
    type Error = InvalidClientId;

    fn try_from(raw: RawKeepalive) -> Result<Self, Self::Error> {
        if !validate::is_valid_client_id(raw.client_id_raw()) {
            return Err(InvalidClientId);
        }
        let client_id = ClientId::parse(raw.client_id_raw());
        Ok(match raw {
            RawKeepalive::Nested(n) => {
                let ip_raw = n.public_ip.or(n.ip).unwrap_or_else(|| "unknown".into());
                Self {
                    client_id,
                    public_ip: validate::validate_public_ip(&ip_raw),
                    location: ValidatedLocation {
                        country: validate::validate_location_string(&n.location.country, "country"),
                        city: validate::validate_location_string(&n.location.city, "city"),
                        region: validate::validate_location_string(&n.location.region, "region"),
                        org: validate::validate_location_string(&n.location.org, "org"),
                        timezone: validate::validate_location_string(&n.location.timezone, "timezone"),
                    },
                    dns: DnsProbeRecord {
                        loc: validate::validate_location_string(&n.dns_test.location, "dns_loc"),
                        colo: validate::validate_location_string(&n.dns_test.colo, "dns_colo"),
                    },
                    client_version: validate::validate_location_string(
                        &n.client_version.unwrap_or_else(unknown_field),
                        "version",
                    ),
                }
            }
            RawKeepalive::Flat(f) => {
                let ip_raw = f.public_ip.or(f.ip).unwrap_or_else(|| "unknown".into());
                Self {
                    client_id,
                    public_ip: validate::validate_public_ip(&ip_raw),
                    location: ValidatedLocation {
                        country: validate::validate_location_string(&f.country, "country"),
                        city: validate::validate_location_string(&f.city, "city"),
                        region: validate::validate_location_string(&f.region, "region"),
                        org: validate::validate_location_string(&f.provider, "provider"),
                        timezone: validate::validate_location_string(&f.timezone, "timezone"),
                    },
                    dns: DnsProbeRecord {
                        loc: validate::validate_location_string(&f.dns_loc, "dns_loc"),
                        colo: validate::validate_location_string(&f.dns_colo, "dns_colo"),
                    },
                    client_version: validate::validate_location_string(
                        &f.client_version.unwrap_or_else(unknown_field),
                        "version",
                    ),
                }
            }
        })
    }
}

/// [`ClientStateEntry::from_record`] expects `location` fields directly on
/// the record; this projects [`ValidatedLocation`] into that shape.
impl KeepaliveRecord {
    pub fn location(&self) -> &ValidatedLocation {
        &self.location
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_shape() {
        let body = serde_json::json!({
            "client_id": "office-vpn",
            "public_ip": "91.203.5.146",
            "location": {"country": "GB", "city": "London", "region": "England", "org": "M247", "timezone": "Europe/London"},
            "dns_test": {"location": "GB", "colo": "LHR"}
        });
        let raw: RawKeepalive = serde_json::from_value(body).unwrap();
        let record = KeepaliveRecord::try_from(raw).unwrap();
        assert_eq!(record.client_id.as_str(), "office-vpn");
        assert_eq!(record.public_ip, "91.203.5.146");
        assert_eq!(record.location.country, "GB");
        assert_eq!(record.dns.loc, "GB");
        assert_eq!(record.dns.colo, "LHR");
    }

    #[test]
    fn parses_flat_shape() {
        let body = serde_json::json!({
            "client_id": "office-vpn",
            "ip": "91.203.5.146",
            "country": "GB", "city": "London", "region": "England", "provider": "M247", "timezone": "Europe/London",
            "dns_loc": "GB", "dns_colo": "LHR"
        });
        let raw: RawKeepalive = serde_json::from_value(body).unwrap();
        let record = KeepaliveRecord::try_from(raw).unwrap();
        assert_eq!(record.public_ip, "91.203.5.146");
        assert_eq!(record.location.org, "M247");
        assert_eq!(record.dns.colo, "LHR");
    }

    #[test]
    fn missing_optional_fields_default_to_unknown_sentinels() {
        let body = serde_json::json!({
            "client_id": "bare",
            "ip": "203.0.113.9"
        });
        let raw: RawKeepalive = serde_json::from_value(body).unwrap();
        let record = KeepaliveRecord::try_from(raw).unwrap();
        assert_eq!(record.location.country, "Unknown");
        assert_eq!(record.dns.loc, "Unknown");
    }

    #[test]
    fn partially_invalid_client_id_is_rejected_not_repaired() {
        let body = serde_json::json!({
            "client_id": "My Office!!",
            "ip": "203.0.113.9"
        });
        let raw: RawKeepalive = serde_json::from_value(body).unwrap();
        assert_eq!(KeepaliveRecord::try_from(raw), Err(InvalidClientId));
    }
}
