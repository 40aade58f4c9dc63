//! Chat command router. The table is a fixed array of `{name, handler}`
//! entries initialized once, matched against the lowercased first word of
//! the incoming message after stripping a leading `/`; this realizes the
//! static dispatch table the specification's design notes call for, in
//! place of a runtime string→function registration map.

use chrono::Utc;
use vpn_state::ServerState;

type CommandHandler = fn(&ServerState) -> String;

const COMMANDS: &[(&str, CommandHandler)] = &[
    ("ping", handle_ping),
    ("status", handle_status),
    ("help", handle_help),
];

/// Route one inbound chat message to its handler, or a fallback reply.
pub fn route(state: &ServerState, text: &str) -> String {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix('/') {
        let word = rest.split_whitespace().next().unwrap_or("").to_lowercase();
        match COMMANDS.iter().find(|(name, _)| *name == word) {
            Some((_, handler)) => handler(state),
            None => format!(
                "Unknown command: /{word}\n{}",
                available_commands()
            ),
        }
    } else {
        format!("👋 Hello! I'm the VPN Sentinel bot.\n{}", available_commands())
    }
}

fn available_commands() -> String {
    "Available commands: /ping, /status, /help".to_string()
}

fn handle_ping(state: &ServerState) -> String {
    format!(
        "🏓 Pong\nActive clients: {}\nServer time: {}",
        state.client_count(),
        Utc::now().to_rfc3339()
    )
}

fn handle_status(state: &ServerState) -> String {
    let mut lines = Vec::new();
    state.for_each_client(|id, entry| {
        let age = humanize_age(entry.last_seen);
        lines.push(format!(
            "• {} — {} — {} — {}",
            id, entry.ip, entry.location, age
        ));
    });

    if lines.is_empty() {
        "No clients currently connected.".to_string()
    } else {
        format!("📋 Client status:\n{}", lines.join("\n"))
    }
}

fn handle_help(_state: &ServerState) -> String {
    format!(
        "VPN Sentinel command catalog:\n/ping — active client count and server time\n/status — per-client summary\n/help — this message\n{}",
        available_commands()
    )
}

fn humanize_age(last_seen: chrono::DateTime<Utc>) -> String {
    let delta = Utc::now().signed_duration_since(last_seen);
    let seconds = delta.num_seconds().max(0);
    if seconds < 60 {
        "just now".to_string()
    } else if seconds < 3600 {
        format!("{} minutes ago", seconds / 60)
    } else {
        format!("{} hours ago", seconds / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vpn_proto::{ClientId, DnsProbeRecord, KeepaliveRecord, ValidatedLocation};

    fn sample_state() -> ServerState {
        ServerState::new(vec![], Duration::from_secs(60), 30, Duration::from_secs(1800))
    }

    fn sample_record() -> KeepaliveRecord {
        KeepaliveRecord {
            client_id: ClientId::parse("office-vpn"),
            public_ip: "91.203.5.146".into(),
            location: ValidatedLocation {
                country: "GB".into(),
                city: "London".into(),
                region: "England".into(),
                org: "M247".into(),
                timezone: "Europe/London".into(),
            },
            dns: DnsProbeRecord {
                loc: "GB".into(),
                colo: "LHR".into(),
            },
            client_version: "1.0.0".into(),
        }
    }

    #[test]
    fn ping_reports_active_client_count() {
        let state = sample_state();
        state.ingest(&sample_record(), Utc::now());
        let reply = route(&state, "/ping");
        assert!(reply.contains("Active clients: 1"));
    }

    #[test]
    fn status_lists_each_client() {
        let state = sample_state();
        state.ingest(&sample_record(), Utc::now());
        let reply = route(&state, "/status");
        assert!(reply.contains("office-vpn"));
    }

    #[test]
    fn status_with_no_clients_says_so() {
        let state = sample_state();
        assert_eq!(route(&state, "/status"), "No clients currently connected.");
    }

    #[test]
    fn unknown_command_lists_available_commands() {
        let state = sample_state();
        let reply = route(&state, "/frobnicate");
        assert!(reply.contains("Unknown command"));
        assert!(reply.contains("/ping"));
    }

    #[test]
    fn non_command_text_gets_greeting() {
        let state = sample_state();
        let reply = route(&state, "hello there");
        assert!(reply.contains("Hello"));
    }

    #[test]
    fn help_lists_catalog() {
        let state = sample_state();
        let reply = route(&state, "/help");
        assert!(reply.contains("/status"));
    }
}
