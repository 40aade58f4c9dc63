use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sysinfo::{Disks, System};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const CACHE_TTL: Duration = Duration::from_secs(5);

/// Published by the supervisor after every tick: when it last completed an
/// iteration (successful or not). Consumed by the health endpoint to derive
/// `checks.client_process` without any separate process to scrape.
#[derive(Debug, Clone, Copy)]
pub struct HealthSignal {
    pub last_tick: Instant,
}

impl HealthSignal {
    pub fn now() -> Self {
        Self { last_tick: Instant::now() }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Checks {
    client_process: &'static str,
    network_connectivity: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct SystemStats {
    memory_percent: f32,
    disk_percent: f32,
}

#[derive(Debug, Clone, Serialize)]
struct StatusBody {
    status: &'static str,
    timestamp: String,
    checks: Checks,
    system: SystemStats,
    issues: Vec<String>,
}

struct Cached {
    body: StatusBody,
    healthy: bool,
    computed_at: Instant,
}

struct Shared {
    signal: watch::Receiver<HealthSignal>,
    interval: Duration,
    http: reqwest::Client,
    cache: Mutex<Option<Cached>>,
}

#[derive(Clone)]
struct HealthState(Arc<Shared>);

/// Build and serve the client's local health listener. Returns once `stop`
/// is cancelled or the listener fails to bind.
pub async fn run(
    port: u16,
    interval: Duration,
    signal: watch::Receiver<HealthSignal>,
    stop: CancellationToken,
) {
    let state = HealthState(Arc::new(Shared {
        signal,
        interval,
        http: reqwest::Client::new(),
        cache: Mutex::new(None),
    }));

    let router = Router::new()
        .route("/client/health", get(health))
        .route("/client/health/ready", get(ready))
        .route("/client/health/startup", get(startup))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            warn!(error = %err, %addr, "client health endpoint failed to bind, continuing without it");
            return;
        }
    };

    info!(%addr, "client health endpoint listening");
    let serve = axum::serve(listener, router.into_make_service());
    tokio::select! {
        _ = serve => {}
        _ = stop.cancelled() => {
            info!("client health endpoint stopping");
        }
    }
}

async fn compute(state: &HealthState) -> Cached {
    let last_tick = state.0.signal.borrow().last_tick;
    let process_healthy = last_tick.elapsed() <= state.0.interval * 2;

    let net_healthy = vpn_dns::probe_reachable(&state.0.http, Duration::from_secs(5)).await;

    let mut issues = Vec::new();
    if !process_healthy {
        issues.push("submission loop has not completed a tick recently".to_string());
    }
    if !net_healthy {
        issues.push("network connectivity probe failed".to_string());
    }

    let healthy = process_healthy && net_healthy;
    let body = StatusBody {
        status: if healthy { "healthy" } else { "unhealthy" },
        timestamp: Utc::now().to_rfc3339(),
        checks: Checks {
            client_process: if process_healthy { "healthy" } else { "unhealthy" },
            network_connectivity: if net_healthy { "healthy" } else { "unhealthy" },
        },
        system: system_stats(),
        issues,
    };

    Cached { body, healthy, computed_at: Instant::now() }
}

fn system_stats() -> SystemStats {
    let mut sys = System::new();
    sys.refresh_memory();
    let memory_percent = if sys.total_memory() == 0 {
        0.0
    } else {
        (sys.used_memory() as f64 / sys.total_memory() as f64 * 100.0) as f32
    };

    let disks = Disks::new_with_refreshed_list();
    let disk_percent = disks
        .iter()
        .find(|d| d.mount_point().to_str() == Some("/"))
        .or_else(|| disks.iter().next())
        .map(|d| {
            let total = d.total_space();
            if total == 0 {
                0.0
            } else {
                ((total - d.available_space()) as f64 / total as f64 * 100.0) as f32
            }
        })
        .unwrap_or(0.0);

    SystemStats { memory_percent, disk_percent }
}

async fn cached_status(state: &HealthState) -> (bool, StatusBody) {
    {
        let cache = state.0.cache.lock();
        if let Some(cached) = cache.as_ref() {
            if cached.computed_at.elapsed() < CACHE_TTL {
                return (cached.healthy, cached.body.clone());
            }
        }
    }

    let fresh = compute(state).await;
    let result = (fresh.healthy, fresh.body.clone());
    *state.0.cache.lock() = Some(fresh);
    result
}

async fn health(State(state): State<HealthState>) -> impl IntoResponse {
    let (healthy, body) = cached_status(&state).await;
    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(body))
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    timestamp: String,
}

async fn ready(State(state): State<HealthState>) -> impl IntoResponse {
    let (healthy, _) = cached_status(&state).await;
    let status = if healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    let body = ReadyBody {
        status: if healthy { "ready" } else { "not-ready" },
        timestamp: Utc::now().to_rfc3339(),
    };
    (status, Json(body))
}

#[derive(Serialize)]
struct StartupBody {
    status: &'static str,
    timestamp: String,
}

async fn startup() -> impl IntoResponse {
    Json(StartupBody { status: "started", timestamp: Utc::now().to_rfc3339() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_signal_elapsed_is_immediately_fresh() {
        let signal = HealthSignal::now();
        assert!(signal.last_tick.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn system_stats_are_in_range() {
        let stats = system_stats();
        assert!(stats.memory_percent >= 0.0 && stats.memory_percent <= 100.0);
        assert!(stats.disk_percent >= 0.0 && stats.disk_percent <= 100.0);
    }
}
