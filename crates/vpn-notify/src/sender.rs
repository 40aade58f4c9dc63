use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram enabled but missing bot token or chat id")]
    MissingCredentials,
}

/// Telegram transport configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramConfig {
    /// Validate the startup requirement from the specification: if the
    /// transport is enabled, both credentials must be present, or the
    /// process must refuse to start.
    pub fn validate(&self) -> Result<(), NotifyError> {
        if self.enabled && (self.bot_token.is_empty() || self.chat_id.is_empty()) {
            return Err(NotifyError::MissingCredentials);
        }
        Ok(())
    }
}

/// Send one message to the configured chat. Returns `false` on any
/// transport failure rather than propagating an error — notification
/// failures must never block ingestion (§7).
pub async fn send(client: &reqwest::Client, config: &TelegramConfig, text: &str) -> bool {
    if !config.enabled {
        debug!("telegram transport disabled, dropping notification");
        return false;
    }

    let url = format!("https://api.telegram.org/bot{}/sendMessage", config.bot_token);
    let body = serde_json::json!({
        "chat_id": config.chat_id,
        "text": text,
        "parse_mode": "HTML",
        "disable_notification": false,
    });

    match client.post(&url).json(&body).send().await {
        Ok(response) if response.status().is_success() => true,
        Ok(response) => {
            warn!(status = %response.status(), "telegram sendMessage rejected");
            false
        }
        Err(err) => {
            warn!(error = %err, "telegram sendMessage transport failure");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_transport_requires_no_credentials() {
        let config = TelegramConfig {
            enabled: false,
            bot_token: String::new(),
            chat_id: String::new(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn enabled_transport_without_credentials_is_fatal() {
        let config = TelegramConfig {
            enabled: true,
            bot_token: String::new(),
            chat_id: "123".into(),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn enabled_transport_with_credentials_is_valid() {
        let config = TelegramConfig {
            enabled: true,
            bot_token: "token".into(),
            chat_id: "123".into(),
        };
        assert!(config.validate().is_ok());
    }
}
