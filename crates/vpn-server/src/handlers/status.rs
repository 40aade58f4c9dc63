use crate::state::AppState;
use axum::extract::State;
use axum::Json;

/// `GET <api-path>/status` — the entire client state map as JSON.
pub async fn status(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::to_value(app.store.status_snapshot()).unwrap_or_default())
}
