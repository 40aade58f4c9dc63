//! VPN Sentinel aggregation server: authenticated keepalive ingestion,
//! canonical client-state store, stale-client eviction, health
//! classification, and notification dispatch.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod eviction;
pub mod handlers;
pub mod middleware;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use config::TlsPaths;
use state::AppState;
use std::net::SocketAddr;

/// Build the authenticated API router (keepalive + status), wrapped in
/// the Security Gate. This router is never composed with the health or
/// dashboard routers.
pub fn build_api_router(app: AppState) -> Router {
    Router::new()
        .route(&format!("{}/keepalive", app.api_path), post(handlers::keepalive::keepalive))
        .route(&format!("{}/status", app.api_path), get(handlers::status::status))
        .route_layer(axum::middleware::from_fn_with_state(
            app.clone(),
            middleware::security_gate,
        ))
        .with_state(app)
}

/// Build the public health router, bound to its own listener port.
pub fn build_health_router(app: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/ready", get(handlers::health::ready))
        .route("/health/startup", get(handlers::health::startup))
        .with_state(app)
}

/// Build the public dashboard router, bound to its own listener port.
pub fn build_dashboard_router(app: AppState) -> Router {
    Router::new()
        .route("/dashboard", get(handlers::dashboard::dashboard))
        .route("/dashboard/", get(handlers::dashboard::dashboard))
        .route("/logs", get(handlers::logs::logs))
        .with_state(app)
}

/// Serve `router` on `addr`, over HTTPS if `tls` names a cert/key pair, else
/// plain HTTP. All three listeners (API, health, dashboard) share whatever
/// the operator configured — matching the original's single TLS toggle
/// applied uniformly to every listener.
pub async fn serve(router: Router, addr: SocketAddr, tls: Option<&TlsPaths>) -> std::io::Result<()> {
    match tls {
        Some(paths) => {
            let tls_config =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(&paths.cert, &paths.key).await?;
            axum_server::bind_rustls(addr, tls_config)
                .serve(router.into_make_service_with_connect_info::<SocketAddr>())
                .await
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
        }
    }
}
