use crate::error::ConfigError;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use vpn_notify::TelegramConfig;

/// Server configuration, resolved once at startup from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub api_path: String,
    pub api_key: String,
    pub api_port: u16,
    pub health_port: u16,
    pub dashboard_port: u16,
    pub allowed_ips: Vec<IpAddr>,
    pub rate_limit_window: Duration,
    pub rate_limit_burst: usize,
    pub client_timeout: Duration,
    pub geolocation_service: String,
    pub telegram: TelegramConfig,
    /// Present only when both `VPN_SENTINEL_TLS_CERT_PATH` and
    /// `VPN_SENTINEL_TLS_KEY_PATH` are set; enables HTTPS on all three
    /// listeners instead of plain HTTP.
    pub tls: Option<TlsPaths>,
}

#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_port(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidPort(name_leak(name), value)),
        Err(_) => Ok(default),
    }
}

fn name_leak(name: &str) -> &'static str {
    // Small, fixed set of env var names known at compile time; this avoids
    // allocating a new &'static str per call for a handful of call sites.
    match name {
        "VPN_SENTINEL_SERVER_API_PORT" => "VPN_SENTINEL_SERVER_API_PORT",
        "VPN_SENTINEL_SERVER_HEALTH_PORT" => "VPN_SENTINEL_SERVER_HEALTH_PORT",
        "VPN_SENTINEL_SERVER_DASHBOARD_PORT" => "VPN_SENTINEL_SERVER_DASHBOARD_PORT",
        _ => "UNKNOWN_PORT_VAR",
    }
}

fn normalize_api_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/api/v1".to_string()
    } else {
        format!("/{trimmed}")
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let allowed_ips = match std::env::var("VPN_SENTINEL_SERVER_ALLOWED_IPS") {
            Ok(raw) if !raw.trim().is_empty() => raw
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<IpAddr>()
                        .map_err(|_| ConfigError::InvalidAllowedIp(s.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => Vec::new(),
        };

        let rate_limit_burst: usize = std::env::var("VPN_SENTINEL_SERVER_RATE_LIMIT_REQUESTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);
        let rate_limit_window_secs: u64 = std::env::var("VPN_SENTINEL_SERVER_RATE_LIMIT_WINDOW")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        let client_timeout_minutes: u64 = std::env::var("VPN_SENTINEL_CLIENT_TIMEOUT_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let bot_token = env_or("TELEGRAM_BOT_TOKEN", "");
        let chat_id = env_or("TELEGRAM_CHAT_ID", "");
        let enabled = match std::env::var("VPN_SENTINEL_TELEGRAM_ENABLED") {
            Ok(v) => v.eq_ignore_ascii_case("true"),
            Err(_) => !bot_token.is_empty() && !chat_id.is_empty(),
        };
        let telegram = TelegramConfig {
            enabled,
            bot_token,
            chat_id,
        };
        telegram.validate()?;

        let tls = match (
            std::env::var("VPN_SENTINEL_TLS_CERT_PATH"),
            std::env::var("VPN_SENTINEL_TLS_KEY_PATH"),
        ) {
            (Ok(cert), Ok(key)) if !cert.trim().is_empty() && !key.trim().is_empty() => {
                Some(TlsPaths { cert: PathBuf::from(cert), key: PathBuf::from(key) })
            }
            _ => None,
        };

        Ok(Self {
            api_path: normalize_api_path(&env_or("VPN_SENTINEL_API_PATH", "/api/v1")),
            api_key: env_or("VPN_SENTINEL_API_KEY", ""),
            api_port: env_port("VPN_SENTINEL_SERVER_API_PORT", 5000)?,
            health_port: env_port("VPN_SENTINEL_SERVER_HEALTH_PORT", 8081)?,
            dashboard_port: env_port("VPN_SENTINEL_SERVER_DASHBOARD_PORT", 8080)?,
            allowed_ips,
            rate_limit_window: Duration::from_secs(rate_limit_window_secs),
            rate_limit_burst,
            client_timeout: Duration::from_secs(client_timeout_minutes * 60),
            geolocation_service: env_or("VPN_SENTINEL_GEOLOCATION_SERVICE", "auto"),
            telegram,
            tls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_api_path_variants() {
        assert_eq!(normalize_api_path("/api/v1"), "/api/v1");
        assert_eq!(normalize_api_path("api/v1"), "/api/v1");
        assert_eq!(normalize_api_path("/api/v1/"), "/api/v1");
        assert_eq!(normalize_api_path(""), "/api/v1");
    }
}
