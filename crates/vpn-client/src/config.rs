use crate::error::{ClientError, ClientResult};
use std::time::Duration;

/// Client configuration, resolved once at startup from the environment
/// (§6 of the specification).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub api_path: String,
    pub client_id: Option<String>,
    pub interval: Duration,
    pub timeout: Duration,
    pub api_key: String,
    pub allow_insecure: bool,
    pub tls_ca_path: Option<String>,
    pub health_port: u16,
    pub health_monitor_enabled: bool,
    pub geolocation_service: String,
    pub test_capture_path: Option<String>,
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.to_string())
}

fn env_u64(first: &str, second: &str, default: u64) -> u64 {
    env_opt(first)
        .or_else(|| env_opt(second))
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Build the keepalive submission URL from `VPN_SENTINEL_URL` and
/// `VPN_SENTINEL_API_PATH`, normalizing slashes on both segments.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/').trim_end_matches('/');
    if path.is_empty() {
        format!("{base}/keepalive")
    } else {
        format!("{base}/{path}/keepalive")
    }
}

impl ClientConfig {
    pub fn from_env() -> ClientResult<Self> {
        let server_url = env_opt("VPN_SENTINEL_URL")
            .ok_or_else(|| ClientError::Config("VPN_SENTINEL_URL is required".into()))?;

        Ok(Self {
            server_url,
            api_path: env_or("VPN_SENTINEL_API_PATH", "/api/v1"),
            client_id: env_opt("VPN_SENTINEL_CLIENT_ID"),
            interval: Duration::from_secs(env_u64("VPN_SENTINEL_INTERVAL", "INTERVAL", 300)),
            timeout: Duration::from_secs(env_u64("VPN_SENTINEL_TIMEOUT", "TIMEOUT", 30)),
            api_key: env_or("VPN_SENTINEL_API_KEY", ""),
            allow_insecure: env_or("VPN_SENTINEL_ALLOW_INSECURE", "false").eq_ignore_ascii_case("true"),
            tls_ca_path: env_opt("VPN_SENTINEL_TLS_CERT_PATH"),
            health_port: env_opt("VPN_SENTINEL_HEALTH_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8082),
            health_monitor_enabled: !env_or("VPN_SENTINEL_HEALTH_MONITOR", "true").eq_ignore_ascii_case("false"),
            geolocation_service: env_or("VPN_SENTINEL_GEOLOCATION_SERVICE", "auto"),
            test_capture_path: env_opt("VPN_SENTINEL_TEST_CAPTURE_PATH"),
        })
    }

    /// Generate an auto client id: `vpn-client-<last-7-digits-of-epoch><6-random-digits>`.
    pub fn generate_client_id(epoch_secs: u64, random_suffix: u32) -> String {
        let epoch_str = epoch_secs.to_string();
        let last7: String = epoch_str.chars().rev().take(7).collect::<String>().chars().rev().collect();
        format!("vpn-client-{last7}{:06}", random_suffix % 1_000_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("https://host", "/api/v1"), "https://host/api/v1/keepalive");
        assert_eq!(join_url("https://host/", "api/v1/"), "https://host/api/v1/keepalive");
        assert_eq!(join_url("https://host", ""), "https://host/keepalive");
    }

    #[test]
    fn generated_client_id_has_expected_shape() {
        let id = ClientConfig::generate_client_id(1_732_000_123, 42);
        assert!(id.starts_with("vpn-client-"));
        assert_eq!(id.len(), "vpn-client-".len() + 7 + 6);
    }
}
