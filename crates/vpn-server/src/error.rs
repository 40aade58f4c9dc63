use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid port in {0}: {1}")]
    InvalidPort(&'static str, String),
    #[error("invalid IP address in VPN_SENTINEL_SERVER_ALLOWED_IPS: {0}")]
    InvalidAllowedIp(String),
    #[error(transparent)]
    Telegram(#[from] vpn_notify::sender::NotifyError),
}

/// Errors surfaced by the authenticated API handlers, mapped to the exact
/// status codes specified for the ingestion endpoints.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no JSON data provided")]
    NoBody,
    #[error("invalid client_id format")]
    InvalidClientId,
    #[error("internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::NoBody | ApiError::InvalidClientId => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
