use crate::{commands, sender, TelegramConfig};
use serde::Deserialize;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};
use vpn_state::ServerState;

#[derive(Debug, Deserialize)]
struct GetUpdatesResponse {
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    text: Option<String>,
    chat: Chat,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: serde_json::Value,
}

/// Run the inbound long-poll loop until `stop` is cancelled. Every message
/// from the configured chat is routed through the command table; messages
/// from other chats are logged and ignored.
pub async fn run(
    client: reqwest::Client,
    config: TelegramConfig,
    state: Arc<ServerState>,
    stop: CancellationToken,
) {
    if !config.enabled {
        return;
    }

    let last_update_id = AtomicI64::new(0);

    while !stop.is_cancelled() {
        let offset = last_update_id.load(Ordering::Relaxed) + 1;
        let url = format!(
            "https://api.telegram.org/bot{}/getUpdates?offset={offset}&timeout=30",
            config.bot_token
        );

        let poll = tokio::select! {
            _ = stop.cancelled() => break,
            result = client.get(&url).timeout(Duration::from_secs(35)).send() => result,
        };

        match poll {
            Ok(response) => match response.json::<GetUpdatesResponse>().await {
                Ok(body) => {
                    for update in body.result {
                        last_update_id.fetch_max(update.update_id, Ordering::Relaxed);
                        handle_update(&client, &config, &state, &update, &config.chat_id).await;
                    }
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                Err(err) => {
                    warn!(error = %err, "failed to decode telegram getUpdates body");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                }
            },
            Err(err) => {
                error!(error = %err, "telegram long-poll request failed");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

async fn handle_update(
    client: &reqwest::Client,
    config: &TelegramConfig,
    state: &ServerState,
    update: &Update,
    configured_chat_id: &str,
) {
    let Some(message) = &update.message else {
        return;
    };
    let chat_id = chat_id_as_string(&message.chat.id);
    if chat_id != configured_chat_id {
        warn!(chat_id, "ignoring update from unconfigured chat");
        return;
    }
    let Some(text) = &message.text else {
        return;
    };

    let reply = commands::route(state, text);
    sender::send(client, config, &reply).await;
}

fn chat_id_as_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_id_normalizes_numeric_and_string_forms() {
        assert_eq!(chat_id_as_string(&serde_json::json!(12345)), "12345");
        assert_eq!(chat_id_as_string(&serde_json::json!("12345")), "12345");
    }
}
