use crate::state::AppState;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Background sweep: every 60 seconds, remove client entries whose
/// `last_seen` exceeds the configured timeout, from both the state store
/// and the first-seen set (§4.S5).
pub async fn run(app: AppState, stop: CancellationToken) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = interval.tick() => {}
        }

        let evicted = app.store.evict_stale(Utc::now());
        for id in &evicted {
            info!(client_id = %id, "cleanup: evicted stale client");
        }

        if app.store.should_notify_no_clients() {
            let http = app.http.clone();
            let telegram = app.telegram.clone();
            tokio::spawn(async move {
                vpn_notify::sender::send(&http, &telegram, &vpn_notify::Event::NoClients.render()).await;
            });
        }
    }
}
