//! vpn-server — VPN Sentinel aggregation server
//!
//! Aggregates keepalives from client agents, classifies their health, and
//! notifies an operator over a chat transport.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vpn_server::config::ServerConfig;
use vpn_server::state::AppState;

/// TLS is configured via `VPN_SENTINEL_TLS_CERT_PATH`/`VPN_SENTINEL_TLS_KEY_PATH`
/// (see [`ServerConfig`]), not CLI flags, matching every other recognized
/// setting in this binary.
#[derive(Parser)]
#[command(name = "vpn-server")]
#[command(about = "VPN Sentinel aggregation server")]
#[command(version)]
struct Cli {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("vpn_server=info".parse()?))
        .init();

    let _cli = Cli::parse();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "fatal misconfiguration at startup");
            std::process::exit(1);
        }
    };

    let store = Arc::new(vpn_state::ServerState::new(
        config.allowed_ips.clone(),
        config.rate_limit_window,
        config.rate_limit_burst,
        config.client_timeout,
    ));

    let geolocation_service = match vpn_geo::ServiceSelector::parse(&config.geolocation_service) {
        Ok(service) => Some(service),
        Err(err) => {
            error!(error = %err, service = %config.geolocation_service, "unrecognized geolocation service, resolution disabled");
            None
        }
    };

    let http = reqwest::Client::builder().build()?;

    let app = AppState {
        store,
        api_key: Arc::new(config.api_key.clone()),
        api_path: Arc::new(config.api_path.clone()),
        http,
        telegram: config.telegram.clone(),
        geolocation_service,
    };

    let stop = CancellationToken::new();

    let eviction_handle = tokio::spawn(vpn_server::eviction::run(app.clone(), stop.clone()));

    let poller_handle = {
        let app = app.clone();
        let stop = stop.clone();
        tokio::spawn(async move {
            vpn_notify::poller::run(app.http.clone(), app.telegram.clone(), app.store.clone(), stop).await;
        })
    };

    vpn_notify::sender::send(
        &app.http,
        &app.telegram,
        &vpn_notify::Event::ServerStarted {
            rate_window_secs: config.rate_limit_window.as_secs(),
            rate_burst: config.rate_limit_burst,
            client_timeout_minutes: config.client_timeout.as_secs() / 60,
            at: chrono::Utc::now(),
        }
        .render(),
    )
    .await;

    info!(port = config.api_port, tls = config.tls.is_some(), "starting authenticated API listener");
    let api_router = vpn_server::build_api_router(app.clone());
    let api_addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let api_tls = config.tls.clone();
    let api_task = tokio::spawn(async move { vpn_server::serve(api_router, api_addr, api_tls.as_ref()).await });

    info!(port = config.health_port, tls = config.tls.is_some(), "starting health listener");
    let health_router = vpn_server::build_health_router(app.clone());
    let health_addr = SocketAddr::from(([0, 0, 0, 0], config.health_port));
    let health_tls = config.tls.clone();
    let health_task =
        tokio::spawn(async move { vpn_server::serve(health_router, health_addr, health_tls.as_ref()).await });

    info!(port = config.dashboard_port, tls = config.tls.is_some(), "starting dashboard listener");
    let dashboard_router = vpn_server::build_dashboard_router(app.clone());
    let dashboard_addr = SocketAddr::from(([0, 0, 0, 0], config.dashboard_port));
    let dashboard_tls = config.tls.clone();
    let dashboard_task = tokio::spawn(async move {
        vpn_server::serve(dashboard_router, dashboard_addr, dashboard_tls.as_ref()).await
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received, stopping background tasks");
    stop.cancel();

    let _ = tokio::time::timeout(Duration::from_secs(5), eviction_handle).await;
    let _ = tokio::time::timeout(Duration::from_secs(5), poller_handle).await;
    api_task.abort();
    health_task.abort();
    dashboard_task.abort();

    Ok(())
}
