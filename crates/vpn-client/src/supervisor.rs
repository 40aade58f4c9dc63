use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::health_endpoint::{self, HealthSignal};
use crate::payload::{build, submit, SubmitOutcome};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const STEP: Duration = Duration::from_millis(250);

/// Run the client's main cycle: resolve geolocation, probe DNS egress,
/// assemble and submit a keepalive, sleep, repeat — until `stop` fires.
pub async fn run(config: ClientConfig, stop: CancellationToken) {
    let client_id = config
        .client_id
        .clone()
        .unwrap_or_else(|| ClientConfig::generate_client_id(epoch_secs(), random_suffix()));
    info!(client_id = %client_id, server = %config.server_url, "starting client supervisor");

    let http = match build_http_client(&config).await {
        Ok(client) => client,
        Err(err) => {
            warn!(error = %err, "failed to build http client, aborting");
            return;
        }
    };

    let (signal_tx, signal_rx) = watch::channel(HealthSignal::now());

    let health_task = if config.health_monitor_enabled {
        let health_stop = stop.clone();
        let port = config.health_port;
        let interval = config.interval;
        Some(tokio::spawn(async move {
            health_endpoint::run(port, interval, signal_rx, health_stop).await;
        }))
    } else {
        None
    };

    loop {
        if stop.is_cancelled() {
            break;
        }

        tick(&http, &config, &client_id).await;
        let _ = signal_tx.send(HealthSignal::now());

        if !sleep_interruptible(config.interval, &stop).await {
            break;
        }
    }

    info!("client supervisor stopping");
    if let Some(task) = health_task {
        let _ = tokio::time::timeout(Duration::from_secs(5), task).await;
    }
}

/// Build the outbound HTTP client, honoring the TLS trust configuration:
/// `allow_insecure` skips certificate verification entirely, else a
/// `tls_ca_path` is trusted in addition to the system roots, else the
/// system default trust store applies.
async fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client, ClientError> {
    let mut builder = reqwest::Client::builder();
    if config.allow_insecure {
        builder = builder.danger_accept_invalid_certs(true);
    } else if let Some(path) = &config.tls_ca_path {
        let pem = tokio::fs::read(path).await?;
        let cert = reqwest::Certificate::from_pem(&pem)?;
        builder = builder.add_root_certificate(cert);
    }
    Ok(builder.build()?)
}

async fn tick(http: &reqwest::Client, config: &ClientConfig, client_id: &str) {
    let geo = match vpn_geo::ServiceSelector::parse(&config.geolocation_service) {
        Ok(service) => vpn_geo::resolve(http, service, config.timeout).await,
        Err(err) => {
            warn!(client_id, error = %err, service = %config.geolocation_service, "unrecognized geolocation service, skipping resolution");
            vpn_proto::GeoRecord::unknown()
        }
    };

    if geo.is_empty() {
        warn!(client_id, "geolocation resolution failed, skipping this cycle");
        return;
    }

    let dns = vpn_dns::probe(http, config.timeout).await;
    let payload = build(client_id, &geo, &dns);

    match submit(http, config, &payload).await {
        SubmitOutcome::Sent => info!(client_id, ip = %geo.ip, "keepalive submitted"),
        SubmitOutcome::Captured => info!(client_id, "keepalive captured to test file"),
        SubmitOutcome::Failed => warn!(client_id, "keepalive submission failed, will retry next cycle"),
    }
}

/// Sleep for `duration` in small increments, returning `false` early if
/// `stop` is cancelled mid-sleep.
async fn sleep_interruptible(duration: Duration, stop: &CancellationToken) -> bool {
    let mut remaining = duration;
    while remaining > Duration::ZERO {
        if stop.is_cancelled() {
            return false;
        }
        let step = remaining.min(STEP);
        tokio::select! {
            _ = tokio::time::sleep(step) => {}
            _ = stop.cancelled() => return false,
        }
        remaining = remaining.saturating_sub(step);
    }
    !stop.is_cancelled()
}

fn epoch_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn random_suffix() -> u32 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    RandomState::new().build_hasher().finish() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sleep_interruptible_returns_false_when_already_cancelled() {
        let stop = CancellationToken::new();
        stop.cancel();
        let completed = sleep_interruptible(Duration::from_secs(5), &stop).await;
        assert!(!completed);
    }

    #[tokio::test]
    async fn sleep_interruptible_returns_true_when_it_runs_to_completion() {
        let stop = CancellationToken::new();
        let completed = sleep_interruptible(Duration::from_millis(10), &stop).await;
        assert!(completed);
    }
}
