use crate::config::{join_url, ClientConfig};
use chrono::Local;
use serde::Serialize;
use std::path::Path;
use tracing::warn;
use vpn_proto::{DnsProbeRecord, GeoRecord};

/// The outgoing wire shape this agent sends: the nested form from the
/// specification's data model (§3). The server also accepts a flat form,
/// but this agent always emits nested.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingKeepalive {
    pub client_id: String,
    pub timestamp: String,
    pub public_ip: String,
    pub status: &'static str,
    pub location: OutgoingLocation,
    pub dns_test: OutgoingDnsTest,
    pub client_version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingLocation {
    pub country: String,
    pub city: String,
    pub region: String,
    pub org: String,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingDnsTest {
    pub location: String,
    pub colo: String,
}

/// Assemble the canonical keepalive payload from the supervisor's last
/// geolocation and DNS readings.
pub fn build(client_id: &str, geo: &GeoRecord, dns: &DnsProbeRecord) -> OutgoingKeepalive {
    OutgoingKeepalive {
        client_id: client_id.to_string(),
        timestamp: Local::now().to_rfc3339(),
        public_ip: geo.ip.clone(),
        status: "alive",
        location: OutgoingLocation {
            country: geo.country.clone(),
            city: geo.city.clone(),
            region: geo.region.clone(),
            org: geo.org.clone(),
            timezone: geo.timezone.clone(),
        },
        dns_test: OutgoingDnsTest {
            location: dns.loc.clone(),
            colo: dns.colo.clone(),
        },
        client_version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Sent,
    Captured,
    Failed,
}

/// Submit a keepalive payload: either over HTTP, or — when
/// `VPN_SENTINEL_TEST_CAPTURE_PATH` is set — appended as one compact JSON
/// line to that file instead of performing any network I/O.
pub async fn submit(client: &reqwest::Client, config: &ClientConfig, payload: &OutgoingKeepalive) -> SubmitOutcome {
    if let Some(capture_path) = &config.test_capture_path {
        return capture(capture_path, payload).await;
    }

    let url = join_url(&config.server_url, &config.api_path);
    let mut request = client.post(&url).json(payload).timeout(config.timeout);
    if !config.api_key.is_empty() {
        request = request.header("X-API-Key", &config.api_key);
    }

    match request.send().await {
        Ok(response) if response.status().is_success() => SubmitOutcome::Sent,
        Ok(response) => {
            warn!(status = %response.status(), "keepalive submission rejected");
            SubmitOutcome::Failed
        }
        Err(err) => {
            warn!(error = %err, "keepalive submission transport failure");
            SubmitOutcome::Failed
        }
    }
}

async fn capture(path: &str, payload: &OutgoingKeepalive) -> SubmitOutcome {
    if let Some(parent) = Path::new(path).parent() {
        let _ = tokio::fs::create_dir_all(parent).await;
    }

    let line = match serde_json::to_string(payload) {
        Ok(json) => json,
        Err(_) => format!("{:?}", payload).replace('\n', " "),
    };

    match tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
    {
        Ok(mut file) => {
            use tokio::io::AsyncWriteExt;
            let _ = file.write_all(line.as_bytes()).await;
            let _ = file.write_all(b"\n").await;
            SubmitOutcome::Captured
        }
        Err(err) => {
            warn!(error = %err, "failed to open test capture file");
            SubmitOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_assembles_nested_shape_from_readings() {
        let geo = GeoRecord {
            ip: "91.203.5.146".into(),
            country: "GB".into(),
            city: "London".into(),
            region: "England".into(),
            org: "M247".into(),
            timezone: "Europe/London".into(),
            source: "ipinfo.io".into(),
        };
        let dns = DnsProbeRecord {
            loc: "GB".into(),
            colo: "LHR".into(),
        };
        let payload = build("office-vpn", &geo, &dns);
        assert_eq!(payload.client_id, "office-vpn");
        assert_eq!(payload.public_ip, "91.203.5.146");
        assert_eq!(payload.location.country, "GB");
        assert_eq!(payload.dns_test.colo, "LHR");
        assert_eq!(payload.status, "alive");
    }

    #[tokio::test]
    async fn capture_mode_appends_one_json_line_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/capture.jsonl");
        let path_str = path.to_str().unwrap();

        let config = ClientConfig {
            server_url: "https://example.invalid".into(),
            api_path: "/api/v1".into(),
            client_id: None,
            interval: std::time::Duration::from_secs(300),
            timeout: std::time::Duration::from_secs(30),
            api_key: String::new(),
            allow_insecure: false,
            tls_ca_path: None,
            health_port: 8082,
            health_monitor_enabled: true,
            geolocation_service: "auto".into(),
            test_capture_path: Some(path_str.to_string()),
        };

        let geo = GeoRecord {
            ip: "203.0.113.9".into(),
            country: "US".into(),
            city: "Unknown".into(),
            region: "Unknown".into(),
            org: "Unknown".into(),
            timezone: "Unknown".into(),
            source: "ip-api.com".into(),
        };
        let dns = DnsProbeRecord::default();
        let payload = build("node-a", &geo, &dns);

        let client = reqwest::Client::new();
        let outcome = submit(&client, &config, &payload).await;
        assert!(matches!(outcome, SubmitOutcome::Captured));

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("node-a"));
    }
}
