//! Pure, side-effect-free field sanitizers applied to every ingested
//! keepalive field before it reaches the state store. `client_id` is the
//! one field that must fail the request outright on an invalid value; every
//! other field silently substitutes a sentinel instead.

use std::net::IpAddr;

const MAX_LOCATION_LEN: usize = 100;

/// Whole-string accept/reject check for a raw `client_id`. Unlike
/// [`crate::ClientId::parse`] (which normalizes), this never repairs an
/// invalid id — callers must reject the request when this returns `false`,
/// matching the `validate_client_id`-style reject-on-any-bad-char check this
/// is grounded on.
pub fn is_valid_client_id(raw: &str) -> bool {
    let trimmed = raw.trim();
    !trimmed.is_empty()
        && trimmed.len() <= 100
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
}

/// Coerce a raw IP string to a validated literal, or the sentinel `unknown`.
pub fn validate_public_ip(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.parse::<IpAddr>() {
        Ok(addr) => addr.to_string(),
        Err(_) => "unknown".to_string(),
    }
}

/// Coerce a free-text location-ish field (country, city, region, org,
/// timezone, version) to a trimmed, length-bounded string, or `Unknown`.
///
/// `field` is used only for the diagnostic log line callers attach on
/// rejection; this function performs no logging itself.
pub fn validate_location_string(raw: &str, field: &str) -> String {
    let _ = field;
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_LOCATION_LEN {
        return "Unknown".to_string();
    }
    let allowed = trimmed.chars().all(|c| {
        c.is_alphanumeric()
            || c.is_whitespace()
            || matches!(c, '.' | ',' | '\'' | '"' | '-' | '/' | '_')
    });
    if allowed {
        trimmed.to_string()
    } else {
        "Unknown".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_accepts_and_rejects() {
        assert!(is_valid_client_id("office-vpn"));
        assert!(!is_valid_client_id(""));
        assert!(!is_valid_client_id("has spaces"));
        assert!(!is_valid_client_id("My Office!!"));
        assert!(!is_valid_client_id(&"a".repeat(101)));
    }

    #[test]
    fn public_ip_accepts_v4_and_v6() {
        assert_eq!(validate_public_ip("91.203.5.146"), "91.203.5.146");
        assert_eq!(validate_public_ip("  10.0.0.1  "), "10.0.0.1");
        assert_eq!(validate_public_ip("not-an-ip"), "unknown");
        assert_eq!(validate_public_ip(""), "unknown");
        assert!(validate_public_ip("2001:db8::1").contains(':'));
    }

    #[test]
    fn location_string_rejects_overlong_and_unsafe() {
        assert_eq!(validate_location_string("London", "city"), "London");
        assert_eq!(validate_location_string("", "city"), "Unknown");
        assert_eq!(
            validate_location_string(&"x".repeat(200), "city"),
            "Unknown"
        );
        assert_eq!(
            validate_location_string("Europe/London", "timezone"),
            "Europe/London"
        );
        assert_eq!(validate_location_string("bad<script>", "city"), "Unknown");
    }
}
