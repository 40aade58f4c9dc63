//! Security Gate: IP whitelist → sliding-window rate limiter → API key,
//! applied in that fixed order to every authenticated endpoint. Health and
//! dashboard routers never compose with this layer.

use crate::state::AppState;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::net::{IpAddr, SocketAddr};
use tracing::{info, warn};

fn extract_client_ip(headers: &HeaderMap, peer: SocketAddr) -> IpAddr {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            if let Ok(ip) = first.trim().parse::<IpAddr>() {
                return ip;
            }
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if let Ok(ip) = real_ip.trim().parse::<IpAddr>() {
            return ip;
        }
    }
    peer.ip()
}

fn denied(status: StatusCode, error: &str, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": error, "message": message }))).into_response()
}

pub async fn security_gate(
    State(app): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let client_ip = extract_client_ip(request.headers(), peer);

    if !app.store.is_ip_allowed(client_ip) {
        warn!(%client_ip, path, outcome = "blocked_whitelist", "security gate rejected request");
        return denied(
            StatusCode::FORBIDDEN,
            "Access denied",
            "Your IP address is not authorized",
        );
    }

    if !app.store.rate_limiter.check(client_ip) {
        warn!(%client_ip, path, outcome = "rate_limited", "security gate rejected request");
        return denied(
            StatusCode::TOO_MANY_REQUESTS,
            "Rate limit exceeded",
            "Too many requests. Please try again later.",
        );
    }

    if app.api_key.is_empty() {
        warn!("VPN_SENTINEL_API_KEY not configured — authentication disabled");
        info!(%client_ip, path, outcome = "allowed_unauthenticated", "security gate passed request");
        return next.run(request).await;
    }

    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided.is_empty() {
        warn!(%client_ip, path, outcome = "missing_api_key", "security gate rejected request");
        return denied(
            StatusCode::UNAUTHORIZED,
            "Authentication required",
            "X-API-Key header is required",
        );
    }

    if provided != app.api_key.as_str() {
        warn!(%client_ip, path, outcome = "invalid_api_key", "security gate rejected request");
        return denied(
            StatusCode::FORBIDDEN,
            "Authentication failed",
            "Invalid API key",
        );
    }

    info!(%client_ip, path, outcome = "allowed", "security gate passed request");
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ip_from_x_forwarded_for_first_token() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        let peer: SocketAddr = "127.0.0.1:1234".parse().unwrap();
        assert_eq!(
            extract_client_ip(&headers, peer),
            "203.0.113.9".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn falls_back_to_peer_address() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "198.51.100.7:1234".parse().unwrap();
        assert_eq!(
            extract_client_ip(&headers, peer),
            "198.51.100.7".parse::<IpAddr>().unwrap()
        );
    }
}
