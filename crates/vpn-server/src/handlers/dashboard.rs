//! Dashboard rendering is deliberately out of core scope — a read-only
//! HTML projection of server state that any template engine could produce.
//! This satisfies the external interface contract (`GET /dashboard`) with
//! a minimal render; a real deployment would swap this for a templating
//! crate without touching any other module.

use crate::state::AppState;
use axum::extract::State;
use axum::response::Html;
use vpn_classify::HealthStatus;

pub async fn dashboard(State(app): State<AppState>) -> Html<String> {
    let server_ip = app.store.server_ip().unwrap_or_else(|| "unknown".into());
    let mut rows = String::new();
    app.store.for_each_client(|id, entry| {
        let status = app
            .store
            .classify(id)
            .unwrap_or(HealthStatus::DnsUndetectable);
        rows.push_str(&format!(
            "<tr><td>{id}</td><td>{}</td><td>{}</td><td>{status}</td></tr>\n",
            entry.ip, entry.location
        ));
    });

    Html(format!(
        "<html><body><h1>VPN Sentinel</h1><p>Server IP: {server_ip}</p><table><tr><th>Client</th><th>IP</th><th>Location</th><th>Status</th></tr>{rows}</table></body></html>"
    ))
}
