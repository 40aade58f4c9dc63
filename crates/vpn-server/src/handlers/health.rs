use axum::Json;
use chrono::Utc;

/// `GET /health` — liveness probe. The server process has no background
/// dependency that can make it unhealthy once started; it is a constant
/// success as long as the process is scheduled to answer requests.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "timestamp": Utc::now().to_rfc3339() }))
}

/// `GET /health/ready` — readiness probe.
pub async fn ready() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "timestamp": Utc::now().to_rfc3339() }))
}

/// `GET /health/startup` — startup probe, always succeeds.
pub async fn startup() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "started", "timestamp": Utc::now().to_rfc3339() }))
}
