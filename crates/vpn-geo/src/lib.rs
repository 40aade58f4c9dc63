//! Geolocation resolver: queries a fixed provider chain and normalizes the
//! result to the shared [`vpn_proto::GeoRecord`] shape.

#![forbid(unsafe_code)]

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use vpn_proto::GeoRecord;

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("unknown geolocation provider: {0}")]
    UnknownProvider(String),
}

/// Which provider(s) to consult. `Auto` tries every provider in priority
/// order and returns the first success; a named provider is single-shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSelector {
    Auto,
    IpInfo,
    IpApi,
    IpWhois,
}

impl ServiceSelector {
    pub fn parse(name: &str) -> Result<Self, GeoError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "auto" | "" => Ok(Self::Auto),
            "ipinfo" | "ipinfo.io" => Ok(Self::IpInfo),
            "ip-api" | "ip-api.com" => Ok(Self::IpApi),
            "ipwhois" | "ipwhois.app" => Ok(Self::IpWhois),
            other => Err(GeoError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Provider {
    IpInfo,
    IpApi,
    IpWhois,
}

impl Provider {
    const ALL: [Provider; 3] = [Provider::IpInfo, Provider::IpApi, Provider::IpWhois];

    fn url(self) -> &'static str {
        match self {
            Provider::IpInfo => "https://ipinfo.io/json",
            Provider::IpApi => "http://ip-api.com/json",
            Provider::IpWhois => "https://ipwhois.app/json/",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Provider::IpInfo => "ipinfo.io",
            Provider::IpApi => "ip-api.com",
            Provider::IpWhois => "ipwhois.app",
        }
    }

    async fn fetch(self, client: &reqwest::Client, timeout: Duration) -> Option<GeoRecord> {
        let response = client
            .get(self.url())
            .timeout(timeout)
            .send()
            .await
            .inspect_err(|err| debug!(provider = self.name(), error = %err, "geolocation request failed"))
            .ok()?;

        if !response.status().is_success() {
            debug!(provider = self.name(), status = %response.status(), "geolocation provider non-200");
            return None;
        }

        let record = match self {
            Provider::IpInfo => response.json::<IpInfoBody>().await.ok()?.into_record(),
            Provider::IpApi => response.json::<IpApiBody>().await.ok()?.into_record(),
            Provider::IpWhois => response.json::<IpWhoisBody>().await.ok()?.into_record(),
        };

        if record.ip.trim().is_empty() {
            debug!(provider = self.name(), "geolocation provider returned empty ip");
            return None;
        }
        Some(record)
    }
}

#[derive(Debug, Deserialize)]
struct IpInfoBody {
    #[serde(default)]
    ip: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    org: String,
    #[serde(default)]
    timezone: String,
}

impl IpInfoBody {
    fn into_record(self) -> GeoRecord {
        GeoRecord {
            ip: fallback(self.ip),
            country: fallback(self.country),
            city: fallback(self.city),
            region: fallback(self.region),
            org: fallback(self.org),
            timezone: fallback(self.timezone),
            source: "ipinfo.io".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiBody {
    #[serde(default)]
    query: String,
    #[serde(default)]
    ip: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    city: String,
    #[serde(default, rename = "regionName")]
    region_name: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    isp: String,
    #[serde(default)]
    org: String,
    #[serde(default)]
    timezone: String,
}

impl IpApiBody {
    fn into_record(self) -> GeoRecord {
        let ip = if !self.query.is_empty() {
            self.query
        } else {
            self.ip
        };
        let region = if !self.region_name.is_empty() {
            self.region_name
        } else {
            self.region
        };
        let org = if !self.isp.is_empty() {
            self.isp
        } else {
            self.org
        };
        GeoRecord {
            ip: fallback(ip),
            country: fallback(self.country),
            city: fallback(self.city),
            region: fallback(region),
            org: fallback(org),
            timezone: fallback(self.timezone),
            source: "ip-api.com".into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpWhoisBody {
    #[serde(default)]
    ip: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    city: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    org: String,
    #[serde(default)]
    timezone: String,
    #[serde(default)]
    asn: Option<IpWhoisAsn>,
}

#[derive(Debug, Deserialize)]
struct IpWhoisAsn {
    #[serde(default)]
    name: String,
}

impl IpWhoisBody {
    fn into_record(self) -> GeoRecord {
        let org = if !self.org.is_empty() {
            self.org
        } else {
            self.asn.map(|a| a.name).unwrap_or_default()
        };
        GeoRecord {
            ip: fallback(self.ip),
            country: fallback(self.country),
            city: fallback(self.city),
            region: fallback(self.region),
            org: fallback(org),
            timezone: fallback(self.timezone),
            source: "ipwhois.app".into(),
        }
    }
}

fn fallback(value: String) -> String {
    if value.trim().is_empty() {
        "Unknown".to_string()
    } else {
        value
    }
}

/// Resolve the caller's public geolocation record, trying providers in
/// priority order (or a single named provider) until one succeeds.
pub async fn resolve(
    client: &reqwest::Client,
    service: ServiceSelector,
    timeout: Duration,
) -> GeoRecord {
    let providers: &[Provider] = match service {
        ServiceSelector::Auto => &Provider::ALL,
        ServiceSelector::IpInfo => &[Provider::IpInfo],
        ServiceSelector::IpApi => &[Provider::IpApi],
        ServiceSelector::IpWhois => &[Provider::IpWhois],
    };

    for provider in providers {
        if let Some(record) = provider.fetch(client, timeout).await {
            return record;
        }
    }

    warn!("all geolocation providers failed, returning empty record");
    GeoRecord::unknown()
}
