use std::sync::Arc;
use vpn_notify::TelegramConfig;
use vpn_state::ServerState;

/// Everything an axum handler needs, bundled into one cheaply-`Clone`able
/// value (grounded on the `ServerState(Arc<ServerStateInner>)` newtype
/// pattern used for axum app state in the wider ecosystem).
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ServerState>,
    pub api_key: Arc<String>,
    pub api_path: Arc<String>,
    pub http: reqwest::Client,
    pub telegram: TelegramConfig,
    /// `None` when `VPN_SENTINEL_GEOLOCATION_SERVICE` names an unrecognized
    /// provider — resolution is then skipped entirely rather than silently
    /// substituting a different provider mode.
    pub geolocation_service: Option<vpn_geo::ServiceSelector>,
}
