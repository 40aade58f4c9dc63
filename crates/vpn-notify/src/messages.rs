use chrono::{DateTime, Utc};

/// State-transition events that surface as an outbound chat notification.
#[derive(Debug, Clone)]
pub enum Event {
    ServerStarted {
        rate_window_secs: u64,
        rate_burst: usize,
        client_timeout_minutes: u64,
        at: DateTime<Utc>,
    },
    ClientConnected {
        client_id: String,
        ip: String,
        city: String,
        region: String,
        country: String,
        provider: String,
        timezone: String,
        dns_loc: String,
        dns_colo: String,
        server_ip: String,
        client_version: String,
    },
    IpChanged {
        client_id: String,
        old_ip: String,
        new_ip: String,
        city: String,
        region: String,
        country: String,
        provider: String,
        timezone: String,
        dns_loc: String,
        dns_colo: String,
        server_ip: String,
        client_version: String,
    },
    NoClients,
}

impl Event {
    /// Render this event into the HTML message body sent to Telegram.
    pub fn render(&self) -> String {
        match self {
            Event::ServerStarted {
                rate_window_secs,
                rate_burst,
                client_timeout_minutes,
                at,
            } => format!(
                "🚀 <b>Server Started</b>\nRate limit: {rate_burst} req / {rate_window_secs}s\nClient timeout: {client_timeout_minutes} min\nTime: {at}",
                at = at.to_rfc3339()
            ),
            Event::ClientConnected {
                client_id,
                ip,
                city,
                region,
                country,
                provider,
                timezone,
                dns_loc,
                dns_colo,
                server_ip,
                client_version,
            } => format!(
                "✅ <b>VPN Connected!</b>\nClient: {client_id}\nIP: {ip} (server: {server_ip})\nLocation: {city}, {region}, {country}\nProvider: {provider}\nTimezone: {timezone}\nDNS: {dns_loc} / {dns_colo}\nVersion: {client_version}"
            ),
            Event::IpChanged {
                client_id,
                old_ip,
                new_ip,
                city,
                region,
                country,
                provider,
                timezone,
                dns_loc,
                dns_colo,
                server_ip,
                client_version,
            } => format!(
                "🔄 <b>VPN IP Changed!</b>\nClient: {client_id}\n{old_ip} → {new_ip} (server: {server_ip})\nLocation: {city}, {region}, {country}\nProvider: {provider}\nTimezone: {timezone}\nDNS: {dns_loc} / {dns_colo}\nVersion: {client_version}"
            ),
            Event::NoClients => "⚠️ <b>No VPN Clients Connected</b>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_connected_renders_identifying_fields() {
        let event = Event::ClientConnected {
            client_id: "office-vpn".into(),
            ip: "91.203.5.146".into(),
            city: "London".into(),
            region: "England".into(),
            country: "GB".into(),
            provider: "M247".into(),
            timezone: "Europe/London".into(),
            dns_loc: "GB".into(),
            dns_colo: "LHR".into(),
            server_ip: "79.116.8.43".into(),
            client_version: "1.0.0".into(),
        };
        let rendered = event.render();
        assert!(rendered.contains("office-vpn"));
        assert!(rendered.contains("91.203.5.146"));
        assert!(rendered.contains("VPN Connected"));
    }

    #[test]
    fn no_clients_renders_fixed_message() {
        assert!(Event::NoClients.render().contains("No VPN Clients"));
    }
}
