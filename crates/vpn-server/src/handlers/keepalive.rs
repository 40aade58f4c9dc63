use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use tracing::{info, warn};
use vpn_proto::{KeepaliveRecord, RawKeepalive};
use vpn_state::IngestOutcome;

/// `POST <api-path>/keepalive`. See specification §4.S4 for the full
/// ten-step contract this implements.
pub async fn keepalive(
    State(app): State<AppState>,
    body: Result<Json<RawKeepalive>, axum::extract::rejection::JsonRejection>,
) -> Response {
    let Ok(Json(raw)) = body else {
        return ApiError::NoBody.into_response();
    };

    let Ok(record) = KeepaliveRecord::try_from(raw) else {
        return ApiError::InvalidClientId.into_response();
    };

    if app.store.server_ip().is_none() {
        let resolved = match app.geolocation_service {
            Some(service) => vpn_geo::resolve(&app.http, service, std::time::Duration::from_secs(10)).await,
            None => vpn_proto::GeoRecord::unknown(),
        };
        if !resolved.is_empty() {
            app.store.set_server_ip_if_unset(resolved.ip);
        }
    }

    let now = Utc::now();
    let outcome = app.store.ingest(&record, now);
    let server_ip = app.store.server_ip().unwrap_or_else(|| "unknown".into());

    info!(client_id = %record.client_id, "accepted keepalive");
    info!(
        city = %record.location.city,
        country = %record.location.country,
        ip = %record.public_ip,
        provider = %record.location.org,
        "vpn-info"
    );

    if record.public_ip == server_ip || record.public_ip == "unknown" {
        warn!(client_id = %record.client_id, ip = %record.public_ip, "VPN BYPASS WARNING: client shares server's public IP");
    }

    let event = match &outcome {
        IngestOutcome::NewClient => Some(vpn_notify::Event::ClientConnected {
            client_id: record.client_id.to_string(),
            ip: record.public_ip.clone(),
            city: record.location.city.clone(),
            region: record.location.region.clone(),
            country: record.location.country.clone(),
            provider: record.location.org.clone(),
            timezone: record.location.timezone.clone(),
            dns_loc: record.dns.loc.clone(),
            dns_colo: record.dns.colo.clone(),
            server_ip: server_ip.clone(),
            client_version: record.client_version.clone(),
        }),
        IngestOutcome::IpChanged { old_ip, new_ip } => Some(vpn_notify::Event::IpChanged {
            client_id: record.client_id.to_string(),
            old_ip: old_ip.clone(),
            new_ip: new_ip.clone(),
            city: record.location.city.clone(),
            region: record.location.region.clone(),
            country: record.location.country.clone(),
            provider: record.location.org.clone(),
            timezone: record.location.timezone.clone(),
            dns_loc: record.dns.loc.clone(),
            dns_colo: record.dns.colo.clone(),
            server_ip: server_ip.clone(),
            client_version: record.client_version.clone(),
        }),
        IngestOutcome::Unchanged => None,
    };

    if let Some(event) = event {
        let http = app.http.clone();
        let telegram = app.telegram.clone();
        tokio::spawn(async move {
            vpn_notify::sender::send(&http, &telegram, &event.render()).await;
        });
    }

    Json(serde_json::json!({
        "status": "ok",
        "message": "Keepalive received",
        "server_time": now.to_rfc3339(),
    }))
    .into_response()
}
